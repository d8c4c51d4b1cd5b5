mod result_set;
mod row;
mod run;

pub use result_set::ResultSet;
pub use row::CustomDbRow;
pub use run::RunResult;
