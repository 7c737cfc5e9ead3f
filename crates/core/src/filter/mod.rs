// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Boolean filter expressions over record fields.
//!
//! A filter is a tree of `and`, `or` and `not` nodes over leaf predicates.
//! Its JSON form mirrors the tree:
//!
//! ```text
//! {}                                      # matches everything
//! {"status": "active"}                    # equality
//! {"name": {"$regex": "^an", "$options": "i"}}  # pattern match
//! {"age": [18, 65]}                       # inclusive range
//! {"and": [{"status": "active"}, {"not": {"age": [0, 17]}}]}
//! {"or": {"status": "active", "owner": "me"}}   # each entry is a sub-filter
//! {"status": "active", "owner": "me"}     # several keys: implicit and
//! ```
//!
//! Evaluation is total: unknown fields simply fail leaf predicates.

mod eval;
mod expr;
mod parser;

pub use eval::{apply, evaluate};
pub use expr::{Filter, Predicate};
pub use parser::parse_filter;
