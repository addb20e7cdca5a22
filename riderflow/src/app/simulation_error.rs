use crate::{
    config::ConfigurationError,
    model::{density::DensityError, event::SinkError, reservoir::ReservoirError},
};
use riderflow_route::model::RouteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("failure building route: {source}")]
    RouteError {
        #[from]
        source: RouteError,
    },
    #[error(transparent)]
    ConfigurationError {
        #[from]
        source: ConfigurationError,
    },
    #[error(transparent)]
    ReservoirError {
        #[from]
        source: ReservoirError,
    },
    #[error(transparent)]
    DensityError {
        #[from]
        source: DensityError,
    },
    #[error("failure creating event sink: {source}")]
    SinkError {
        #[from]
        source: SinkError,
    },
    #[error("unknown reservoir {0}")]
    UnknownReservoir(String),
    #[error("{0}")]
    RuntimeError(String),
}
