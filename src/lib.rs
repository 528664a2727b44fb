pub mod libprep;
