// This module pairs every value kind with its two user-facing roles: the
// storage class (a named, mutable, register-bound Variable) and the computed
// class (a transient Expression produced by one operation). Both roles share
// the kind's operator algebra; what the registry records is the cross-linked
// triple kind <-> storage class <-> computed class, established exactly once
// for the process. The class records supply the type names that appear in
// Debug output and in error messages ("SignedWord" vs "SignedWordEx"), which
// is how diagnostics distinguish a stored value from an intermediate result.

//! Kind registry: one storage class and one computed class per value kind.

use std::sync::OnceLock;

use super::error::{CodegenError, CodegenResult};
use super::kind::{Kind, KIND_COUNT};

/// Class record for the storage role of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageClass {
    kind: Kind,
    name: &'static str,
}

impl StorageClass {
    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Class record for the computed-value role of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputedClass {
    kind: Kind,
    name: &'static str,
}

impl ComputedClass {
    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A registered kind with its cross-linked class records.
#[derive(Debug, Clone, Copy)]
pub struct KindEntry {
    pub kind: Kind,
    pub storage: StorageClass,
    pub computed: ComputedClass,
}

/// Fixed table keyed by the kind enum.
#[derive(Debug, Default)]
pub struct KindRegistry {
    entries: [Option<KindEntry>; KIND_COUNT],
}

impl KindRegistry {
    pub fn new() -> Self {
        KindRegistry {
            entries: [None; KIND_COUNT],
        }
    }

    /// Register `kind` with its storage and computed class names.
    ///
    /// Registering the same kind twice is an error: the kind/class triple is
    /// fixed for the program's lifetime.
    pub fn register(
        &mut self,
        kind: Kind,
        storage_name: &'static str,
        computed_name: &'static str,
    ) -> CodegenResult<()> {
        let slot = &mut self.entries[kind.index()];
        if slot.is_some() {
            return Err(CodegenError::DuplicateKind { kind: storage_name });
        }
        *slot = Some(KindEntry {
            kind,
            storage: StorageClass { kind, name: storage_name },
            computed: ComputedClass { kind, name: computed_name },
        });
        Ok(())
    }

    pub fn get(&self, kind: Kind) -> Option<&KindEntry> {
        self.entries[kind.index()].as_ref()
    }

    /// Storage class of a registered kind. Panics if `kind` was never
    /// registered; every kind is registered in the builtin table.
    pub fn storage(&self, kind: Kind) -> &StorageClass {
        match self.get(kind) {
            Some(entry) => &entry.storage,
            None => unreachable!("kind registered at initialization"),
        }
    }

    /// Computed class of a registered kind; same contract as [`storage`].
    ///
    /// [`storage`]: KindRegistry::storage
    pub fn computed(&self, kind: Kind) -> &ComputedClass {
        match self.get(kind) {
            Some(entry) => &entry.computed,
            None => unreachable!("kind registered at initialization"),
        }
    }
}

/// The builtin kinds, in registration order.
const USER_KINDS: &[(Kind, &str, &str)] = &[
    (Kind::Bits, "Bits", "BitsEx"),
    (Kind::UnsignedWord, "UnsignedWord", "UnsignedWordEx"),
    (Kind::SignedWord, "SignedWord", "SignedWordEx"),
    (Kind::SingleFloat, "SingleFloat", "SingleFloatEx"),
    (Kind::DoubleFloat, "DoubleFloat", "DoubleFloatEx"),
];

/// The process-wide registry, built once before any operator use.
pub fn registry() -> &'static KindRegistry {
    static REGISTRY: OnceLock<KindRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut table = KindRegistry::new();
        for &(kind, storage_name, computed_name) in USER_KINDS {
            if table.register(kind, storage_name, computed_name).is_err() {
                unreachable!("builtin kinds register exactly once");
            }
        }
        table
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triple_is_cross_linked_for_every_kind() {
        for &(kind, _, _) in USER_KINDS {
            let entry = registry().get(kind).unwrap();
            assert_eq!(entry.kind, kind);
            assert_eq!(entry.storage.kind(), kind);
            assert_eq!(entry.computed.kind(), kind);
        }
    }

    #[test]
    fn class_names_follow_the_storage_name() {
        assert_eq!(registry().storage(Kind::SignedWord).name(), "SignedWord");
        assert_eq!(registry().computed(Kind::SignedWord).name(), "SignedWordEx");
        assert_eq!(registry().computed(Kind::Bits).name(), "BitsEx");
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut table = KindRegistry::new();
        table.register(Kind::Bits, "Bits", "BitsEx").unwrap();
        assert_eq!(
            table.register(Kind::Bits, "Bits", "BitsEx"),
            Err(CodegenError::DuplicateKind { kind: "Bits" })
        );
    }

    #[test]
    fn all_builtin_kinds_are_distinct_entries() {
        let mut names = Vec::new();
        for &(kind, _, _) in USER_KINDS {
            names.push(registry().storage(kind).name());
        }
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), USER_KINDS.len());
    }
}
