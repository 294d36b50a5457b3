//! Select controls for the optional filter fields.

use std::fmt::Display;
use std::str::FromStr;

use mobility_map_survey_models::{Gender, VisitorType};

use crate::DashboardError;

/// Label of the choice that unsets the field.
pub const OFF_LABEL: &str = "Off";

/// One choice in a [`SelectControl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption<T> {
    pub label: String,
    /// `None` for the "off" choice.
    pub value: Option<T>,
}

/// A dropdown bound to an optional filter field.
///
/// The first option is always "off"; the rest are the field's values in
/// their source-file labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectControl<T> {
    value: Option<T>,
    options: Vec<SelectOption<T>>,
}

impl<T> SelectControl<T>
where
    T: Copy + PartialEq + Display + FromStr,
{
    #[must_use]
    pub fn new(choices: &[T], value: Option<T>) -> Self {
        let options = std::iter::once(SelectOption {
            label: OFF_LABEL.to_string(),
            value: None,
        })
        .chain(choices.iter().map(|choice| SelectOption {
            label: choice.to_string(),
            value: Some(*choice),
        }))
        .collect();

        Self { value, options }
    }

    #[must_use]
    pub const fn value(&self) -> Option<T> {
        self.value
    }

    #[must_use]
    pub fn options(&self) -> &[SelectOption<T>] {
        &self.options
    }

    /// Label of the selected option.
    #[must_use]
    pub fn selected_label(&self) -> String {
        self.value
            .map_or_else(|| OFF_LABEL.to_string(), |value| value.to_string())
    }

    /// Applies the host's change event. An empty label or [`OFF_LABEL`]
    /// unsets the field.
    ///
    /// # Errors
    ///
    /// * [`DashboardError::UnknownOption`] if the label is not one of the
    ///   options; the selection is left as it was
    pub fn on_change(&mut self, label: &str) -> Result<Option<T>, DashboardError> {
        let label = label.trim();
        let value = if label.is_empty() || label == OFF_LABEL {
            None
        } else {
            let value = T::from_str(label).map_err(|_| DashboardError::UnknownOption {
                label: label.to_string(),
            })?;
            if !self.options.iter().any(|option| option.value == Some(value)) {
                return Err(DashboardError::UnknownOption {
                    label: label.to_string(),
                });
            }
            Some(value)
        };

        self.value = value;
        Ok(value)
    }
}

/// Gender selector.
#[must_use]
pub fn gender_select(value: Option<Gender>) -> SelectControl<Gender> {
    SelectControl::new(Gender::all(), value)
}

/// Visitor type selector.
#[must_use]
pub fn visitor_type_select(value: Option<VisitorType>) -> SelectControl<VisitorType> {
    SelectControl::new(VisitorType::all(), value)
}
