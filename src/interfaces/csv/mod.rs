pub mod balance_writer;
pub mod job_reader;
