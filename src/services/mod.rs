// The ledger engines. Every operation here owns a single database
// transaction: it either applies all of its writes (entity mutation plus the
// matching ledger rows) or none of them. Pure calculations are kept in plain
// functions so the invariants can be tested without a database.
pub mod installment;
pub mod sale;
pub mod stock;
pub mod summary;
