mod facade;

pub use facade::{ClientFacade, ClientFacadeBuilder};
