mod patch;
mod role;
mod user;
mod work_record;

pub use patch::{UserPatch, WorkRecordPatch};
pub use role::Role;
pub use user::{User, PASSWORD_HASH_COST};
pub use work_record::WorkRecord;
