use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("no usable geometry segments supplied")]
    EmptyGeometry,
    #[error("invalid route geometry: {0}")]
    InvalidGeometry(String),
    #[error("route '{0}' has no geometry variants")]
    MissingVariant(String),
    #[error("failure reading geojson: {0}")]
    GeoJsonError(String),
    #[error("{0}")]
    InternalError(String),
}
