pub mod bot;
pub mod bot_user;
pub mod command;
pub mod product;
pub mod proxy;
pub mod transaction;
pub mod user;
pub mod verification;

pub use bot::{
    Bot, BotDetails, BotStats, BotType, Broadcast, CreateBotRequest, PakasirTestResult,
    UpdateBotRequest,
};
pub use bot_user::BotUser;
pub use command::{default_command, Command, SaveCommandRequest, DEFAULT_STORE_COMMANDS};
pub use product::{Product, ProductInput};
pub use proxy::{IpLookup, ProxyCheck, ProxyInput, UserProxy};
pub use transaction::{Transaction, TransactionStatus};
pub use user::{AuthSession, AuthUser};
pub use verification::{
    LinkCheck, SheerIdSettings, SheerIdType, Verification, VerificationState,
    VerificationStatus, VerificationSubmission,
};
