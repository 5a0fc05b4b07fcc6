use crate::{Error, Result};
use rand::{Rng, rng};
use std::sync::Arc;

/// An immutable set of backend endpoints handed out alongside credentials.
///
/// Built once from configuration; clones share the same backing slice, so the
/// pool can be passed to every task without synchronization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointPool {
    endpoints: Arc<[String]>,
}

impl EndpointPool {
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
        }
    }

    /// Picks an endpoint uniformly at random.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoEndpointConfigured`] if the pool is empty.
    pub fn pick(&self) -> Result<&str> {
        self.pick_with(&mut rng())
    }

    /// Like [`pick`](Self::pick), drawing from `rng`.
    pub fn pick_with<R: Rng>(&self, rng: &mut R) -> Result<&str> {
        if self.endpoints.is_empty() {
            return Err(Error::NoEndpointConfigured);
        }
        let idx = rng.random_range(0..self.endpoints.len());
        Ok(&self.endpoints[idx])
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for EndpointPool {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
