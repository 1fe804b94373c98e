// petwalk-api: Async Rust clients for the petWALK door (local HTTP, command socket, cloud)

pub mod cloud;
pub mod command;
pub mod error;
pub mod local;
pub mod transport;

pub use cloud::{CloudClient, CognitoIdentityProvider, IdentityProvider, Session, Tokens};
pub use command::{CommandClient, CommandRequest, DeviceCommand};
pub use error::Error;
pub use local::{ApiField, FieldGroup, LocalClient};
pub use transport::{SessionScope, TransportConfig};
