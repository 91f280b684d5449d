// handle.rs - Owned engine object handles

//! Single-owner wrapper around an engine object handle.
//!
//! The handle is acquired once at construction and released at most once.
//! `release` takes the handle out before calling the native destroy, so a
//! second release and the later drop see nothing to do. Errors raised while
//! releasing from `Drop` are drained from the error slot and logged.

use std::fmt;
use std::sync::Arc;

use crate::vg::backend::{Backend, NativeHandle};
use crate::vg::error::{native_call, Error, Result};

/// Kind of engine object behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ObjectKind {
    Path,
    Paint,
    Image,
}

impl ObjectKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            ObjectKind::Path => "path",
            ObjectKind::Paint => "paint",
            ObjectKind::Image => "image",
        }
    }

    fn destroy(self, vg: &dyn Backend, handle: NativeHandle) {
        match self {
            ObjectKind::Path => vg.destroy_path(handle),
            ObjectKind::Paint => vg.destroy_paint(handle),
            ObjectKind::Image => vg.destroy_image(handle),
        }
    }
}

pub(crate) struct OwnedHandle {
    backend: Arc<dyn Backend>,
    handle: Option<NativeHandle>,
    kind: ObjectKind,
}

impl OwnedHandle {
    /// Run one creation call and take ownership of the handle it returns
    pub(crate) fn acquire(
        backend: Arc<dyn Backend>,
        kind: ObjectKind,
        create: impl FnOnce(&dyn Backend) -> NativeHandle,
    ) -> Result<Self> {
        let handle = native_call(&*backend, create)?;
        if !handle.is_valid() {
            return Err(Error::HandleCreationFailed(kind.name()));
        }
        log::trace!("acquired {} handle {}", kind.name(), handle.raw());
        Ok(OwnedHandle {
            backend,
            handle: Some(handle),
            kind,
        })
    }

    /// The live handle, or `Error::Released`
    pub(crate) fn get(&self) -> Result<NativeHandle> {
        self.handle.ok_or(Error::Released)
    }

    pub(crate) fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub(crate) fn is_released(&self) -> bool {
        self.handle.is_none()
    }

    pub(crate) fn release(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let kind = self.kind;
        log::trace!("releasing {} handle {}", kind.name(), handle.raw());
        native_call(&*self.backend, |vg| kind.destroy(vg, handle))
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("failed to release {} handle: {}", self.kind.name(), e);
        }
    }
}

impl fmt::Debug for OwnedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedHandle")
            .field("kind", &self.kind)
            .field("handle", &self.handle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vg::error::VgError;
    use crate::vg::mock::MockBackend;

    fn paint(mock: &Arc<MockBackend>) -> OwnedHandle {
        let backend: Arc<dyn Backend> = mock.clone();
        OwnedHandle::acquire(backend, ObjectKind::Paint, |vg| vg.create_paint()).unwrap()
    }

    #[test]
    fn test_release_once() {
        let mock = Arc::new(MockBackend::new());
        let mut owned = paint(&mock);
        let raw = owned.get().unwrap();

        owned.release().unwrap();
        owned.release().unwrap();
        drop(owned);

        assert_eq!(mock.calls("vgDestroyPaint"), 1);
        assert!(!mock.is_live(raw));
    }

    #[test]
    fn test_released_handle_is_rejected() {
        let mock = Arc::new(MockBackend::new());
        let mut owned = paint(&mock);
        owned.release().unwrap();
        assert!(owned.is_released());
        assert_eq!(owned.get(), Err(Error::Released));
    }

    #[test]
    fn test_invalid_handle_fails_acquire() {
        let mock = Arc::new(MockBackend::new());
        let backend: Arc<dyn Backend> = mock.clone();
        let result = OwnedHandle::acquire(backend, ObjectKind::Path, |_| NativeHandle::INVALID);
        assert_eq!(result.unwrap_err(), Error::HandleCreationFailed("path"));
    }

    #[test]
    fn test_creation_error_is_reported() {
        let mock = Arc::new(MockBackend::new());
        mock.fail_next("vgCreatePaint", VgError::OutOfMemory);
        let backend: Arc<dyn Backend> = mock.clone();
        let result = OwnedHandle::acquire(backend, ObjectKind::Paint, |vg| vg.create_paint());
        assert_eq!(result.unwrap_err(), Error::Native(VgError::OutOfMemory));
    }

    #[test]
    fn test_drop_drains_error_slot() {
        let mock = Arc::new(MockBackend::new());
        let owned = paint(&mock);
        mock.fail_next("vgDestroyPaint", VgError::BadHandle);
        drop(owned);
        assert_eq!(mock.pending_error(), 0);
    }
}
