pub mod degrees;
pub mod latlng;
pub mod meters;
