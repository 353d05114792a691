//! The heart byte: a value's fundamental kind, ignoring quote/quasi/isotope
//! decoration (spec §3.1).

/// Fundamental value kind. Quote level, quasi-ness, and isotope-ness are
/// tracked separately (see [`crate::quote::QuoteByte`]) so that, for example,
/// `'foo` and `foo` share a heart of `Word` and differ only in quote depth.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Heart {
    Blank = 0,
    Logic,
    Integer,
    Decimal,
    Percent,
    Money,
    Pair,
    Date,
    Time,

    Text,
    File,
    Email,
    Url,
    Tag,
    Issue,
    Binary,

    Word,
    SetWord,
    GetWord,
    MetaWord,
    TheWord,
    TypeWord,

    Block,
    Group,
    Path,
    Tuple,
    Comma,

    Bitset,
    Map,

    Action,
    Frame,
    Object,
    Module,
    Port,
    Error,
    Handle,

    /// The non-storable `void` isotope reified to a heart for inspection
    /// purposes only; ordinary cells never carry this heart directly
    /// (see `QuoteByte::Isotope`).
    Void,
}

impl Heart {
    /// Kinds whose cells never hold a node payload — their two payload words
    /// are always plain machine data (spec §3.1's "embedded payloads").
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            Heart::Blank
                | Heart::Logic
                | Heart::Integer
                | Heart::Decimal
                | Heart::Percent
                | Heart::Money
                | Heart::Pair
                | Heart::Date
                | Heart::Time
                | Heart::Word
                | Heart::SetWord
                | Heart::GetWord
                | Heart::MetaWord
                | Heart::TheWord
                | Heart::TypeWord
                | Heart::Comma
                | Heart::Void
        )
    }

    /// Kinds that are series-flavored: backed by a pooled stub and therefore
    /// dispatched through the shared "series-ness" generics helper
    /// (spec §4.5).
    pub fn is_series(self) -> bool {
        matches!(
            self,
            Heart::Text
                | Heart::File
                | Heart::Email
                | Heart::Url
                | Heart::Tag
                | Heart::Issue
                | Heart::Binary
                | Heart::Block
                | Heart::Group
                | Heart::Path
                | Heart::Tuple
                | Heart::Bitset
                | Heart::Map
        )
    }

    /// Kinds whose series is a paired varlist+keylist context.
    pub fn is_context(self) -> bool {
        matches!(
            self,
            Heart::Frame | Heart::Object | Heart::Module | Heart::Port | Heart::Error
        )
    }

    /// Any-word? test used throughout the evaluator and scanner.
    pub fn is_word(self) -> bool {
        matches!(
            self,
            Heart::Word
                | Heart::SetWord
                | Heart::GetWord
                | Heart::MetaWord
                | Heart::TheWord
                | Heart::TypeWord
        )
    }

    /// Any-number? test used by comparison funneling (spec §4.3).
    pub fn is_number(self) -> bool {
        matches!(self, Heart::Integer | Heart::Decimal | Heart::Percent | Heart::Money)
    }

    /// Any-array? test: the three block-like container kinds.
    pub fn is_array(self) -> bool {
        matches!(self, Heart::Block | Heart::Group | Heart::Path | Heart::Tuple)
    }
}
