//! Override tag prototype table
//!
//! Static registry mapping every known override tag name to the parameter
//! signature used to decode its arguments. The table is built once per
//! process on first use and is read-only afterwards.
//!
//! # Ordering
//!
//! Order is significant for two independent reasons:
//!
//! - Tag names are matched by *prefix* against the raw tag text, so a name
//!   that is a prefix of another (`\b` / `\bord`, `\fs` / `\fscx`) must come
//!   after it. The first prototype whose name prefixes the tag wins.
//! - Overloaded names (`\clip`, `\iclip`) list the rectangular variant before
//!   the vector variant; overload selection walks variants in table order.
//!
//! # Example
//!
//! ```rust
//! use ass_override::prototype::PrototypeTable;
//!
//! let table = PrototypeTable::global();
//! let proto = table.match_prefix("\\bord2.5").unwrap();
//! assert_eq!(proto.name, "\\bord");
//!
//! // 4 arguments select the rectangular clip, anything else the vector clip
//! assert_eq!(table.select("\\clip", 4).unwrap().params.len(), 4);
//! assert_eq!(table.select("\\clip", 1).unwrap().params.len(), 2);
//! ```

use ahash::AHashMap;
use bitflags::bitflags;
use once_cell::sync::Lazy;

/// Data type a parameter slot decodes its token into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamType {
    /// Signed integer
    Int,
    /// Floating point number
    Float,
    /// Verbatim text (colours, alpha, font names, drawings)
    Text,
    /// Boolean written as `0`/`1`
    Bool,
    /// Nested override block, e.g. the modifiers of `\t(...)`
    Block,
}

/// Semantic role of a parameter
///
/// Lets bulk transforms (frame-rate retiming, resolution resampling) find
/// the parameters they need without knowing individual tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamClass {
    /// No special meaning
    #[default]
    Normal,
    /// Size in script pixels (border width, blur strength, font size)
    AbsoluteSize,
    /// Horizontal position in script pixels
    AbsolutePosX,
    /// Vertical position in script pixels
    AbsolutePosY,
    /// Horizontal scale percentage
    RelativeSizeX,
    /// Vertical scale percentage
    RelativeSizeY,
    /// Milliseconds relative to the line start
    RelativeTimeStart,
    /// Milliseconds relative to the line end
    RelativeTimeEnd,
    /// Karaoke duration in centiseconds
    Karaoke,
    /// Vector drawing commands
    Drawing,
    /// `&HBBGGRR&` colour
    Color,
    /// `&HAA&` alpha
    Alpha,
}

bitflags! {
    /// Argument counts for which a parameter slot is present
    ///
    /// Bit *k* set means the slot is filled when exactly *k+1* arguments were
    /// supplied. Only slots that precede other slots need real masks; trailing
    /// slots use [`ParamPresence::ALWAYS`] and simply run out of tokens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ParamPresence: u32 {
        /// Present when 1 argument was supplied
        const ARGS_1 = 1 << 0;
        /// Present when 2 arguments were supplied
        const ARGS_2 = 1 << 1;
        /// Present when 3 arguments were supplied
        const ARGS_3 = 1 << 2;
        /// Present when 4 arguments were supplied
        const ARGS_4 = 1 << 3;
        /// Present when 5 arguments were supplied
        const ARGS_5 = 1 << 4;
        /// Present when 6 arguments were supplied
        const ARGS_6 = 1 << 5;
        /// Present when 7 arguments were supplied
        const ARGS_7 = 1 << 6;
        /// Present for any argument count
        const ALWAYS = u32::MAX;
    }
}

impl ParamPresence {
    /// Flag describing an observed argument count
    ///
    /// Counts past 32 saturate to the highest bit, which only `ALWAYS`
    /// slots match.
    #[must_use]
    pub const fn for_count(count: usize) -> Self {
        if count == 0 {
            return Self::empty();
        }
        let shift = if count > 32 { 31 } else { count - 1 };
        Self::from_bits_retain(1 << shift)
    }
}

/// Prototype of a single override parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamPrototype {
    /// Type the token decodes into
    pub ty: ParamType,
    /// Semantic role
    pub class: ParamClass,
    /// Argument counts for which this slot is filled
    pub presence: ParamPresence,
}

impl ParamPrototype {
    /// Required parameter
    const fn new(ty: ParamType, class: ParamClass) -> Self {
        Self {
            ty,
            class,
            presence: ParamPresence::ALWAYS,
        }
    }

    /// Parameter present only for the given argument counts
    const fn optional(ty: ParamType, class: ParamClass, presence: ParamPresence) -> Self {
        Self {
            ty,
            class,
            presence,
        }
    }

    /// Check whether this slot takes a token when `count` arguments were given
    #[must_use]
    pub const fn present_for(&self, count: usize) -> bool {
        self.presence.intersects(ParamPresence::for_count(count))
    }
}

/// Declared parameter signature of one override tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagPrototype {
    /// Tag name including the leading backslash
    pub name: &'static str,
    /// Ordered parameter slots
    pub params: &'static [ParamPrototype],
}

impl TagPrototype {
    /// Whether the serialized form wraps parameters in parentheses
    #[must_use]
    pub const fn uses_parentheses(&self) -> bool {
        self.params.len() > 1
    }
}

use ParamClass as C;
use ParamType as T;

/// Shorthand for a required parameter
const fn p(ty: ParamType, class: ParamClass) -> ParamPrototype {
    ParamPrototype::new(ty, class)
}

/// Shorthand for a single-parameter tag
const fn single(name: &'static str, params: &'static [ParamPrototype]) -> TagPrototype {
    TagPrototype { name, params }
}

const FLOAT: &[ParamPrototype] = &[p(T::Float, C::Normal)];
const FLOAT_SIZE: &[ParamPrototype] = &[p(T::Float, C::AbsoluteSize)];
const INT: &[ParamPrototype] = &[p(T::Int, C::Normal)];
const INT_SIZE: &[ParamPrototype] = &[p(T::Int, C::AbsoluteSize)];
const BOOL: &[ParamPrototype] = &[p(T::Bool, C::Normal)];
const TEXT: &[ParamPrototype] = &[p(T::Text, C::Normal)];
const COLOR: &[ParamPrototype] = &[p(T::Text, C::Color)];
const ALPHA: &[ParamPrototype] = &[p(T::Text, C::Alpha)];
const KARAOKE: &[ParamPrototype] = &[p(T::Int, C::Karaoke)];
const SCALE_X: &[ParamPrototype] = &[p(T::Float, C::RelativeSizeX)];
const SCALE_Y: &[ParamPrototype] = &[p(T::Float, C::RelativeSizeY)];
const BASELINE: &[ParamPrototype] = &[p(T::Int, C::AbsolutePosY)];

const FADE: &[ParamPrototype] = &[
    p(T::Int, C::Normal),
    p(T::Int, C::Normal),
    p(T::Int, C::Normal),
    p(T::Int, C::RelativeTimeStart),
    p(T::Int, C::RelativeTimeStart),
    p(T::Int, C::RelativeTimeStart),
    p(T::Int, C::RelativeTimeStart),
];

const MOVE: &[ParamPrototype] = &[
    p(T::Float, C::AbsolutePosX),
    p(T::Float, C::AbsolutePosY),
    p(T::Float, C::AbsolutePosX),
    p(T::Float, C::AbsolutePosY),
    p(T::Int, C::RelativeTimeStart),
    p(T::Int, C::RelativeTimeStart),
];

const RECT_CLIP: &[ParamPrototype] = &[
    p(T::Int, C::AbsolutePosX),
    p(T::Int, C::AbsolutePosY),
    p(T::Int, C::AbsolutePosX),
    p(T::Int, C::AbsolutePosY),
];

const VECTOR_CLIP: &[ParamPrototype] = &[
    ParamPrototype::optional(T::Int, C::Normal, ParamPresence::ARGS_2),
    p(T::Text, C::Drawing),
];

const POS: &[ParamPrototype] = &[p(T::Float, C::AbsolutePosX), p(T::Float, C::AbsolutePosY)];
const ORG: &[ParamPrototype] = &[p(T::Int, C::AbsolutePosX), p(T::Int, C::AbsolutePosY)];
const FAD: &[ParamPrototype] = &[
    p(T::Int, C::RelativeTimeStart),
    p(T::Int, C::RelativeTimeEnd),
];

const TRANSFORM: &[ParamPrototype] = &[
    ParamPrototype::optional(
        T::Int,
        C::RelativeTimeStart,
        ParamPresence::ARGS_3.union(ParamPresence::ARGS_4),
    ),
    ParamPrototype::optional(
        T::Int,
        C::RelativeTimeStart,
        ParamPresence::ARGS_3.union(ParamPresence::ARGS_4),
    ),
    ParamPrototype::optional(
        T::Float,
        C::Normal,
        ParamPresence::ARGS_2.union(ParamPresence::ARGS_4),
    ),
    p(T::Block, C::Normal),
];

/// Every known tag, in matching order
const PROTOTYPES: &[TagPrototype] = &[
    single("\\alpha", ALPHA),
    single("\\xbord", FLOAT_SIZE),
    single("\\ybord", FLOAT_SIZE),
    single("\\bord", FLOAT_SIZE),
    single("\\xshad", FLOAT_SIZE),
    single("\\yshad", FLOAT_SIZE),
    single("\\shad", FLOAT_SIZE),
    // \fade(<a1>,<a2>,<a3>,<t1>,<t2>,<t3>,<t4>)
    TagPrototype {
        name: "\\fade",
        params: FADE,
    },
    // \move(<x1>,<y1>,<x2>,<y2>[,<t1>,<t2>])
    TagPrototype {
        name: "\\move",
        params: MOVE,
    },
    // Keep each rect clip immediately before its vector clip
    TagPrototype {
        name: "\\clip",
        params: RECT_CLIP,
    },
    TagPrototype {
        name: "\\clip",
        params: VECTOR_CLIP,
    },
    TagPrototype {
        name: "\\iclip",
        params: RECT_CLIP,
    },
    TagPrototype {
        name: "\\iclip",
        params: VECTOR_CLIP,
    },
    single("\\fscx", SCALE_X),
    single("\\fscy", SCALE_Y),
    TagPrototype {
        name: "\\pos",
        params: POS,
    },
    TagPrototype {
        name: "\\org",
        params: ORG,
    },
    single("\\pbo", BASELINE),
    TagPrototype {
        name: "\\fad",
        params: FAD,
    },
    single("\\fsp", FLOAT_SIZE),
    single("\\frx", FLOAT),
    single("\\fry", FLOAT),
    single("\\frz", FLOAT),
    single("\\fr", FLOAT),
    single("\\fax", FLOAT),
    single("\\fay", FLOAT),
    single("\\1c", COLOR),
    single("\\2c", COLOR),
    single("\\3c", COLOR),
    single("\\4c", COLOR),
    single("\\1a", ALPHA),
    single("\\2a", ALPHA),
    single("\\3a", ALPHA),
    single("\\4a", ALPHA),
    single("\\fe", TEXT),
    single("\\ko", KARAOKE),
    single("\\kf", KARAOKE),
    single("\\be", INT_SIZE),
    single("\\blur", FLOAT_SIZE),
    single("\\fn", TEXT),
    single("\\fs+", FLOAT),
    single("\\fs-", FLOAT),
    single("\\fs", FLOAT_SIZE),
    single("\\an", INT),
    single("\\c", COLOR),
    single("\\b", INT),
    single("\\i", BOOL),
    single("\\u", BOOL),
    single("\\s", BOOL),
    single("\\a", INT),
    single("\\k", KARAOKE),
    single("\\K", KARAOKE),
    single("\\q", INT),
    single("\\p", INT),
    single("\\r", TEXT),
    // \t([<t1>,<t2>,][<accel>,]<style modifiers>)
    TagPrototype {
        name: "\\t",
        params: TRANSFORM,
    },
];

/// Process-wide prototype table
static TABLE: Lazy<PrototypeTable> = Lazy::new(PrototypeTable::build);

/// Registry of tag prototypes with an exact-name index for overloads
#[derive(Debug)]
pub struct PrototypeTable {
    /// Prototypes in matching order
    protos: &'static [TagPrototype],
    /// Name to indices of every variant sharing that name, in table order
    by_name: AHashMap<&'static str, Vec<usize>>,
}

impl PrototypeTable {
    /// Shared table, initialized on first access
    pub fn global() -> &'static Self {
        &TABLE
    }

    /// Build the name index over the static prototype list
    fn build() -> Self {
        let mut by_name: AHashMap<&'static str, Vec<usize>> = AHashMap::with_capacity(64);
        for (idx, proto) in PROTOTYPES.iter().enumerate() {
            by_name.entry(proto.name).or_default().push(idx);
        }
        tracing::trace!(
            prototypes = PROTOTYPES.len(),
            names = by_name.len(),
            "override tag prototype table initialized"
        );
        Self {
            protos: PROTOTYPES,
            by_name,
        }
    }

    /// All prototypes in matching order
    pub fn iter(&self) -> impl Iterator<Item = &'static TagPrototype> {
        self.protos.iter()
    }

    /// Number of prototypes, counting each overload separately
    #[must_use]
    pub fn len(&self) -> usize {
        self.protos.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.protos.is_empty()
    }

    /// First prototype whose name is a literal prefix of `tag_text`
    #[must_use]
    pub fn match_prefix(&self, tag_text: &str) -> Option<&'static TagPrototype> {
        self.protos
            .iter()
            .find(|proto| tag_text.starts_with(proto.name))
    }

    /// Every variant registered under exactly `name`, in table order
    pub fn variants<'t>(&'t self, name: &str) -> impl Iterator<Item = &'static TagPrototype> + 't {
        let protos = self.protos;
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(move |&idx| &protos[idx])
    }

    /// Check if a tag name is known
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Pick the variant of `name` that applies to `arg_count` arguments
    ///
    /// The first variant declaring exactly `arg_count` parameters wins;
    /// otherwise the last variant applies. For `\clip` this means four
    /// arguments select the rectangular form and any other count the vector
    /// form.
    #[must_use]
    pub fn select(&self, name: &str, arg_count: usize) -> Option<&'static TagPrototype> {
        let mut last = None;
        for proto in self.variants(name) {
            if proto.params.len() == arg_count {
                return Some(proto);
            }
            last = Some(proto);
        }
        last
    }
}
