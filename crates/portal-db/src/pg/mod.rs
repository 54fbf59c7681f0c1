//! PostgreSQL repository implementations

mod attendance;
mod break_session;
mod employee;
mod member;
mod user;

pub use attendance::PgAttendanceRepository;
pub use break_session::PgBreakRepository;
pub use employee::PgEmployeeRepository;
pub use member::PgMemberRepository;
pub use user::PgUserRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub members: PgMemberRepository,
    pub employees: PgEmployeeRepository,
    pub breaks: PgBreakRepository,
    pub attendance: PgAttendanceRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            members: PgMemberRepository::new(pool.clone()),
            employees: PgEmployeeRepository::new(pool.clone()),
            breaks: PgBreakRepository::new(pool.clone()),
            attendance: PgAttendanceRepository::new(pool),
        }
    }
}
