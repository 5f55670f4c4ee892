//! Conversions from third-party errors into domain errors

mod conversions;

pub(crate) use conversions::IntoTransportError;
