// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Process-unique identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

use derive_more::with_trait::Display;

/// Defines a process-unique ID newtype backed by its own [`AtomicU64`].
macro_rules! unique_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
        )]
        #[display("{}{_0}", $prefix)]
        pub struct $name(pub u64);

        impl $name {
            #[doc = concat!("Creates a new unique [`", stringify!($name), "`].")]
            #[must_use]
            pub fn new() -> Self {
                static ID: AtomicU64 = AtomicU64::new(0);

                Self(ID.fetch_add(1, Ordering::Relaxed))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

unique_id!(
    /// ID of a [`ScopeNode`](super::ScopeNode).
    ScopeId,
    "scope#"
);

unique_id!(
    /// ID of a [`HookDefinition`](crate::HookDefinition).
    HookId,
    "hook#"
);

unique_id!(
    /// ID of a [`ResolvedStep`](crate::step::ResolvedStep).
    StepId,
    "step#"
);

unique_id!(
    /// ID of a [`ScenarioExecution`](crate::ScenarioExecution).
    ExecutionId,
    "execution#"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let (a, b) = (ScopeId::new(), ScopeId::new());

        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn displays_with_prefix() {
        assert_eq!(HookId(7).to_string(), "hook#7");
        assert_eq!(ScopeId(3).to_string(), "scope#3");
    }
}
