/*!
# IO utilities

Saving of processed records.
!*/
pub mod writer;
