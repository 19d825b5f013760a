//! Open-type dispatch registry
//!
//! Maps `(namespace, key)` pairs to decode functions. Namespaces group the
//! tables of one protocol: plain IEs, protocol extensions, private IEs,
//! and the per-procedure tables segmented by message kind. The registry is
//! built once at startup and then only read; an immutable build shared by
//! reference is safe for concurrent decoding without locks.

use crate::container::MessageBody;
use crate::diagnostics::DiagnosticsBuilder;
use ranper_codec::PerDecoder;
use ranper_core::{MessageKind, PerError, PerResult, PerValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Decoder for one IE or extension value
pub type IeDecodeFn =
    Arc<dyn Fn(&mut PerDecoder<'_>, &DispatchRegistry) -> PerResult<PerValue> + Send + Sync>;

/// Decoder for one procedure's message body
pub type ProcedureDecodeFn = Arc<
    dyn Fn(&mut PerDecoder<'_>, &DispatchRegistry, &mut DiagnosticsBuilder) -> PerResult<MessageBody>
        + Send
        + Sync,
>;

#[derive(Clone)]
enum Handler {
    Ie(IeDecodeFn),
    Procedure(ProcedureDecodeFn),
}

/// Derives the namespace strings of one protocol from its prefix
#[derive(Debug, Clone)]
pub struct ProtocolNamespaces {
    prefix: String,
}

impl ProtocolNamespaces {
    /// Namespaces for a protocol prefix such as `"pcap"`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Table of plain IEs.
    pub fn ies(&self) -> String {
        format!("{}.ies", self.prefix)
    }

    /// Table of protocol extension IEs.
    pub fn extensions(&self) -> String {
        format!("{}.extension", self.prefix)
    }

    /// Table of private IEs.
    pub fn private(&self) -> String {
        format!("{}.private", self.prefix)
    }

    /// Table of procedure bodies for one message kind.
    pub fn procedure(&self, kind: MessageKind) -> String {
        let suffix = match kind {
            MessageKind::InitiatingMessage => "imsg",
            MessageKind::SuccessfulOutcome => "sout",
            MessageKind::UnsuccessfulOutcome => "uout",
            MessageKind::Outcome => "out",
        };
        format!("{}.proc.{}", self.prefix, suffix)
    }
}

/// Accumulates registrations before the registry is frozen
#[derive(Default)]
pub struct RegistryBuilder {
    tables: HashMap<String, HashMap<u32, Handler>>,
}

impl RegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an IE decoder under `(namespace, key)`.
    ///
    /// Registration is idempotent; re-registering a key replaces the
    /// previous decoder.
    pub fn register_ie(
        &mut self,
        namespace: impl Into<String>,
        key: u32,
        decoder: impl Fn(&mut PerDecoder<'_>, &DispatchRegistry) -> PerResult<PerValue>
        + Send
        + Sync
        + 'static,
    ) -> &mut Self {
        self.insert(namespace.into(), key, Handler::Ie(Arc::new(decoder)));
        self
    }

    /// Register a procedure body decoder under `(namespace, key)`.
    pub fn register_procedure(
        &mut self,
        namespace: impl Into<String>,
        key: u32,
        decoder: impl Fn(
            &mut PerDecoder<'_>,
            &DispatchRegistry,
            &mut DiagnosticsBuilder,
        ) -> PerResult<MessageBody>
        + Send
        + Sync
        + 'static,
    ) -> &mut Self {
        self.insert(namespace.into(), key, Handler::Procedure(Arc::new(decoder)));
        self
    }

    fn insert(&mut self, namespace: String, key: u32, handler: Handler) {
        let table = self.tables.entry(namespace).or_default();
        if table.insert(key, handler).is_some() {
            log::debug!("replaced existing registration for key {}", key);
        }
    }

    /// Freeze the registrations into an immutable registry.
    pub fn build(self) -> DispatchRegistry {
        DispatchRegistry {
            tables: self.tables,
        }
    }
}

/// Immutable `(namespace, key)` to decoder mapping
///
/// Build it completely before the first decode; afterwards it may be
/// shared by reference (or `Arc`) across threads.
pub struct DispatchRegistry {
    tables: HashMap<String, HashMap<u32, Handler>>,
}

impl DispatchRegistry {
    /// Look up an IE decoder.
    pub fn lookup_ie(&self, namespace: &str, key: u32) -> Option<IeDecodeFn> {
        match self.tables.get(namespace)?.get(&key)? {
            Handler::Ie(f) => Some(Arc::clone(f)),
            Handler::Procedure(_) => None,
        }
    }

    /// Look up a procedure body decoder.
    pub fn lookup_procedure(&self, namespace: &str, key: u32) -> Option<ProcedureDecodeFn> {
        match self.tables.get(namespace)?.get(&key)? {
            Handler::Procedure(f) => Some(Arc::clone(f)),
            Handler::Ie(_) => None,
        }
    }

    /// Decode an open-type payload through the registered IE decoder.
    ///
    /// A miss is reported as `UnresolvedOpenType`; the caller has already
    /// consumed the payload span, so continuing with the message is its
    /// choice to make, not a parse problem.
    pub fn dispatch_ie(&self, namespace: &str, key: u32, payload: &[u8]) -> PerResult<PerValue> {
        let decoder = self
            .lookup_ie(namespace, key)
            .ok_or_else(|| PerError::UnresolvedOpenType {
                namespace: namespace.to_string(),
                key,
            })?;
        let mut decoder_input = PerDecoder::new(payload);
        decoder(&mut decoder_input, self)
    }

    /// Number of registered keys across all namespaces.
    pub fn len(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces() {
        let ns = ProtocolNamespaces::new("pcap");
        assert_eq!(ns.ies(), "pcap.ies");
        assert_eq!(ns.extensions(), "pcap.extension");
        assert_eq!(ns.procedure(MessageKind::InitiatingMessage), "pcap.proc.imsg");
        assert_eq!(ns.procedure(MessageKind::Outcome), "pcap.proc.out");
    }

    #[test]
    fn test_register_and_dispatch() {
        let mut builder = RegistryBuilder::new();
        builder.register_ie("pcap.ies", 5, |dec, _| {
            Ok(PerValue::Integer(dec.decode_constrained_integer(0, 255)?))
        });
        let registry = builder.build();
        assert_eq!(registry.len(), 1);

        let value = registry.dispatch_ie("pcap.ies", 5, &[42]).unwrap();
        assert_eq!(value.as_integer(), Some(42));
    }

    #[test]
    fn test_dispatch_miss() {
        let registry = RegistryBuilder::new().build();
        let err = registry.dispatch_ie("pcap.ies", 99, &[]).unwrap_err();
        assert!(matches!(
            err,
            PerError::UnresolvedOpenType { key: 99, .. }
        ));
    }

    #[test]
    fn test_re_registration_replaces() {
        let mut builder = RegistryBuilder::new();
        builder.register_ie("t.ies", 1, |_, _| Ok(PerValue::Integer(1)));
        builder.register_ie("t.ies", 1, |_, _| Ok(PerValue::Integer(2)));
        let registry = builder.build();
        assert_eq!(registry.len(), 1);
        let value = registry.dispatch_ie("t.ies", 1, &[]).unwrap();
        assert_eq!(value.as_integer(), Some(2));
    }
}
