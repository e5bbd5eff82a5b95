//! Integration harness: the index/constraint assertor driven through a
//! mocked database collaborator.

mod index_assertor_tests;
