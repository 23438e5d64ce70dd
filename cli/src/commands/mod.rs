mod helpers;
mod lookup;
mod session;
mod summary;

pub(crate) use helpers::parse_date;
pub(crate) use lookup::cmd_lookup;
pub(crate) use session::cmd_session;
