//! Codec configuration: the pointer width and the string bridge.
//!
//! This is the only place target-specific concerns enter the engine. A
//! [`CodecConfig`] is an immutable context value handed to every layout and
//! instantiate call. For callers that prefer a single process-wide setup,
//! [`configure`] stores a default context that [`current`] reads back.

use crate::error::{LayoutError, LayoutResult};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Maximum alignment any field may assume. Also the pointer width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackWidth {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
}

impl PackWidth {
    pub const fn bytes(self) -> usize {
        self as usize
    }

    /// Pack width of the machine running this code.
    pub const fn host() -> Self {
        match std::mem::size_of::<usize>() {
            2 => PackWidth::Two,
            4 => PackWidth::Four,
            _ => PackWidth::Eight,
        }
    }
}

impl TryFrom<u64> for PackWidth {
    type Error = LayoutError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PackWidth::One),
            2 => Ok(PackWidth::Two),
            4 => Ok(PackWidth::Four),
            8 => Ok(PackWidth::Eight),
            other => Err(LayoutError::InvalidPackWidth(other)),
        }
    }
}

impl fmt::Display for PackWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

/// Translates between pointer-sized integers and host strings.
///
/// Implementations are owned by the native interop layer, which decides how
/// strings are allocated and kept alive.
pub trait StringCodec: Send + Sync {
    fn string_to_pointer(&self, value: &str) -> u64;
    fn pointer_to_string(&self, pointer: u64) -> String;
}

/// A [`StringCodec`] built from two closures.
pub struct FnCodec<S, P> {
    to_pointer: S,
    to_string: P,
}

impl<S, P> FnCodec<S, P>
where
    S: Fn(&str) -> u64 + Send + Sync,
    P: Fn(u64) -> String + Send + Sync,
{
    pub fn new(to_pointer: S, to_string: P) -> Self {
        FnCodec {
            to_pointer,
            to_string,
        }
    }
}

impl<S, P> StringCodec for FnCodec<S, P>
where
    S: Fn(&str) -> u64 + Send + Sync,
    P: Fn(u64) -> String + Send + Sync,
{
    fn string_to_pointer(&self, value: &str) -> u64 {
        (self.to_pointer)(value)
    }

    fn pointer_to_string(&self, pointer: u64) -> String {
        (self.to_string)(pointer)
    }
}

/// Settings shared by layout computation and value marshaling.
#[derive(Clone)]
pub struct CodecConfig {
    pub pack: PackWidth,
    pub strings: Arc<dyn StringCodec>,
}

impl CodecConfig {
    pub fn new(pack: PackWidth, strings: impl StringCodec + 'static) -> Self {
        CodecConfig {
            pack,
            strings: Arc::new(strings),
        }
    }

    pub fn from_fns<S, P>(pack: PackWidth, to_pointer: S, to_string: P) -> Self
    where
        S: Fn(&str) -> u64 + Send + Sync + 'static,
        P: Fn(u64) -> String + Send + Sync + 'static,
    {
        Self::new(pack, FnCodec::new(to_pointer, to_string))
    }

    pub fn string_to_pointer(&self, value: &str) -> u64 {
        self.strings.string_to_pointer(value)
    }

    pub fn pointer_to_string(&self, pointer: u64) -> String {
        self.strings.pointer_to_string(pointer)
    }
}

impl fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecConfig")
            .field("pack", &self.pack)
            .finish_non_exhaustive()
    }
}

static DEFAULT_CODEC: Lazy<RwLock<Option<CodecConfig>>> = Lazy::new(|| RwLock::new(None));

/// Installs `config` as the default context, replacing any earlier one.
pub fn configure(config: CodecConfig) {
    let mut slot = DEFAULT_CODEC.write();
    match slot.as_ref() {
        Some(previous) => log::debug!(
            "Replacing struct codec configuration (pack {} -> {})",
            previous.pack,
            config.pack
        ),
        None => log::debug!("Configuring struct codec (pack {})", config.pack),
    }
    *slot = Some(config);
}

/// Returns the default context installed by [`configure`].
pub fn current() -> LayoutResult<CodecConfig> {
    DEFAULT_CODEC.read().clone().ok_or(LayoutError::NotConfigured)
}

/// Returns the default context's pack width.
pub fn current_pack() -> LayoutResult<PackWidth> {
    DEFAULT_CODEC
        .read()
        .as_ref()
        .map(|config| config.pack)
        .ok_or(LayoutError::NotConfigured)
}
