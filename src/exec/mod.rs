pub(crate) mod cpu;
pub(crate) mod dispatch;
pub(crate) mod launch;
pub(crate) mod schedule;
