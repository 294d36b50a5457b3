//! WGS84 to project coordinate transforms.

use std::fmt;

use proj4rs::proj::Proj;

use crate::GeographyError;

/// PROJ definition of the source coordinate system.
pub const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Projects WGS84 longitude/latitude degrees into one target system.
pub struct Projector {
    definition: String,
    source: Proj,
    target: Proj,
}

impl Projector {
    /// Builds a projector for a PROJ definition string.
    ///
    /// # Errors
    ///
    /// * If the definition cannot be parsed
    pub fn new(definition: &str) -> Result<Self, GeographyError> {
        let source = Proj::from_proj_string(WGS84).map_err(|e| GeographyError::Projection {
            message: format!("invalid source definition '{WGS84}': {e}"),
        })?;
        let target = Proj::from_proj_string(definition).map_err(|e| GeographyError::Projection {
            message: format!("invalid projection '{definition}': {e}"),
        })?;

        Ok(Self {
            definition: definition.to_string(),
            source,
            target,
        })
    }

    /// The target PROJ definition.
    #[must_use]
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Projects one point. Geographic targets come back in degrees,
    /// projected targets in their own units.
    ///
    /// # Errors
    ///
    /// * If the point cannot be transformed
    pub fn project(&self, lon: f64, lat: f64) -> Result<(f64, f64), GeographyError> {
        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        proj4rs::transform::transform(&self.source, &self.target, &mut point).map_err(|e| {
            GeographyError::Projection {
                message: format!("cannot project ({lon}, {lat}): {e}"),
            }
        })?;

        if self.target.is_latlong() {
            Ok((point.0.to_degrees(), point.1.to_degrees()))
        } else {
            Ok((point.0, point.1))
        }
    }
}

impl fmt::Debug for Projector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projector")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}
