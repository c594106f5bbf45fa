pub mod result_writer;
