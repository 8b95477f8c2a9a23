pub mod api_client;
pub mod ip_lookup;
pub mod local_storage;
pub mod poller;
pub mod session;

pub use api_client::{ApiClient, ApiResponse, ApiResult};
pub use ip_lookup::IpLocator;
pub use local_storage::LocalStorage;
pub use poller::{PollEvent, PollSchedule, StatusPoller, StatusSource};
