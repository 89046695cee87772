pub mod condor;
pub mod selection;
