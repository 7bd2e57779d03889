//! Request and response DTOs for the REST API.

pub mod driver_dto;
pub mod ride_dto;

pub use driver_dto::{LocationUpdateRequest, LocationUpdateResponse};
pub use ride_dto::{
    AcceptRideRequest, AcceptRideResponse, BookRideRequest, BookRideResponse,
    CompleteRideRequest, CompleteRideResponse, PaymentUpdateRequest, PaymentUpdateResponse,
    RideStatusResponse,
};
