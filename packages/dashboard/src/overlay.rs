//! Host overlay rendering.
//!
//! The host application owns the map renderer and exposes it as an
//! asynchronous sink of `GeoJSON` overlays. The dashboard keeps at most one
//! handle per logical layer and updates it in place once it exists.

use std::collections::BTreeMap;

use async_trait::async_trait;
use geojson::FeatureCollection;
use thiserror::Error;

/// Opaque identifier the host hands back for an added overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayHandle(pub u64);

/// Errors reported by the host renderer.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The host refused an overlay operation.
    #[error("Overlay host rejected {operation}: {message}")]
    Host {
        /// `add`, `update` or `remove`.
        operation: &'static str,
        /// Host-supplied reason.
        message: String,
    },
}

/// The host's overlay renderer.
#[async_trait]
pub trait OverlaySink: Send + Sync {
    /// Adds a new overlay and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError`] if the host rejects the overlay.
    async fn add(&self, geojson: &FeatureCollection) -> Result<OverlayHandle, OverlayError>;

    /// Replaces the contents of an existing overlay.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError`] if the host rejects the update.
    async fn update(
        &self,
        handle: OverlayHandle,
        geojson: &FeatureCollection,
    ) -> Result<(), OverlayError>;

    /// Removes an overlay.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError`] if the host rejects the removal.
    async fn remove(&self, handle: OverlayHandle) -> Result<(), OverlayError>;
}

/// Active overlay handle per layer name.
#[derive(Debug, Default)]
pub struct OverlayLayers {
    handles: BTreeMap<String, OverlayHandle>,
}

impl OverlayLayers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn handle(&self, layer: &str) -> Option<OverlayHandle> {
        self.handles.get(layer).copied()
    }

    /// Shows `geojson` on `layer`, adding the overlay the first time and
    /// updating it afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError`] if the host rejects the operation. A failed
    /// `add` leaves the layer without a handle.
    pub async fn show(
        &mut self,
        sink: &dyn OverlaySink,
        layer: &str,
        geojson: &FeatureCollection,
    ) -> Result<OverlayHandle, OverlayError> {
        if let Some(handle) = self.handle(layer) {
            log::debug!("Updating overlay {layer} ({handle:?})");
            sink.update(handle, geojson).await?;
            return Ok(handle);
        }

        let handle = sink.add(geojson).await?;
        log::debug!("Added overlay {layer} ({handle:?})");
        self.handles.insert(layer.to_string(), handle);
        Ok(handle)
    }

    /// Removes the overlay on `layer`, if there is one. Returns whether an
    /// overlay was removed.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError`] if the host rejects the removal; the handle
    /// is kept so the removal can be retried.
    pub async fn clear(
        &mut self,
        sink: &dyn OverlaySink,
        layer: &str,
    ) -> Result<bool, OverlayError> {
        let Some(handle) = self.handle(layer) else {
            return Ok(false);
        };

        sink.remove(handle).await?;
        self.handles.remove(layer);
        log::debug!("Removed overlay {layer} ({handle:?})");
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum SinkCall {
        Add(usize),
        Update(OverlayHandle, usize),
        Remove(OverlayHandle),
    }

    /// Records every call and hands out sequential handles.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub calls: Mutex<Vec<SinkCall>>,
        pub collections: Mutex<Vec<FeatureCollection>>,
        pub fail: bool,
    }

    impl RecordingSink {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<SinkCall> {
            self.calls.lock().unwrap().clone()
        }

        fn check(&self, operation: &'static str) -> Result<(), OverlayError> {
            if self.fail {
                Err(OverlayError::Host {
                    operation,
                    message: "host unavailable".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl OverlaySink for RecordingSink {
        async fn add(&self, geojson: &FeatureCollection) -> Result<OverlayHandle, OverlayError> {
            self.check("add")?;
            let mut calls = self.calls.lock().unwrap();
            calls.push(SinkCall::Add(geojson.features.len()));
            self.collections.lock().unwrap().push(geojson.clone());
            Ok(OverlayHandle(calls.len() as u64))
        }

        async fn update(
            &self,
            handle: OverlayHandle,
            geojson: &FeatureCollection,
        ) -> Result<(), OverlayError> {
            self.check("update")?;
            self.calls
                .lock()
                .unwrap()
                .push(SinkCall::Update(handle, geojson.features.len()));
            self.collections.lock().unwrap().push(geojson.clone());
            Ok(())
        }

        async fn remove(&self, handle: OverlayHandle) -> Result<(), OverlayError> {
            self.check("remove")?;
            self.calls.lock().unwrap().push(SinkCall::Remove(handle));
            Ok(())
        }
    }

    fn empty() -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: Vec::new(),
            foreign_members: None,
        }
    }

    #[tokio::test]
    async fn adds_once_then_updates() {
        let sink = RecordingSink::default();
        let mut layers = OverlayLayers::new();

        let first = layers.show(&sink, "zones", &empty()).await.unwrap();
        let second = layers.show(&sink, "zones", &empty()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            sink.calls(),
            vec![SinkCall::Add(0), SinkCall::Update(first, 0)]
        );
    }

    #[tokio::test]
    async fn layers_are_tracked_separately() {
        let sink = RecordingSink::default();
        let mut layers = OverlayLayers::new();

        let zones = layers.show(&sink, "zones", &empty()).await.unwrap();
        let labels = layers.show(&sink, "labels", &empty()).await.unwrap();

        assert_ne!(zones, labels);
        assert_eq!(layers.handle("zones"), Some(zones));
        assert_eq!(layers.handle("labels"), Some(labels));
    }

    #[tokio::test]
    async fn clear_removes_and_forgets_handle() {
        let sink = RecordingSink::default();
        let mut layers = OverlayLayers::new();

        let handle = layers.show(&sink, "zones", &empty()).await.unwrap();
        assert!(layers.clear(&sink, "zones").await.unwrap());
        assert!(!layers.clear(&sink, "zones").await.unwrap());
        assert_eq!(layers.handle("zones"), None);

        layers.show(&sink, "zones", &empty()).await.unwrap();
        assert_eq!(
            sink.calls(),
            vec![
                SinkCall::Add(0),
                SinkCall::Remove(handle),
                SinkCall::Add(0)
            ]
        );
    }

    #[tokio::test]
    async fn failed_add_keeps_layer_empty() {
        let sink = RecordingSink::failing();
        let mut layers = OverlayLayers::new();

        assert!(matches!(
            layers.show(&sink, "zones", &empty()).await,
            Err(OverlayError::Host {
                operation: "add",
                ..
            })
        ));
        assert_eq!(layers.handle("zones"), None);
    }
}
