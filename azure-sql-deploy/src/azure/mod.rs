pub mod credentials;
pub mod management;
pub mod resource_id;
pub mod resources;
pub mod transport;

pub use credentials::{AzureResource, CredentialProvider, StaticCredentialProvider};
pub use management::{ArmResponse, ManagementClient};
pub use resources::{ArmResourceProvider, ResourceProvider};
pub use transport::{CannedTransport, HttpTransport, HttpResponse, ReqwestTransport};
