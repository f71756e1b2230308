/// The semantic kind of a Netezza data type.
///
/// Base kinds carry the object identifier Netezza ships them with ([`NzTypeId::builtin_oid`]),
/// although the authoritative OID always comes from the catalog. The four nested kinds
/// (`Array`, `Range`, `Domain`, `Record`) only ever exist as the kind of a resolved
/// [`NzType`][crate::NzType].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(clippy::module_name_repetitions)]
pub enum NzTypeId {
    // Boolean
    Bool,

    // Binary and character data
    Bytea,
    Char,
    Name,
    Text,
    Bpchar,
    Varchar,
    Nchar,
    Nvarchar,

    // Integers
    Int1,
    Int2,
    Int4,
    Int8,

    // Catalog identifiers
    Int2vector,
    Regproc,
    Oid,
    Tid,
    Xid,
    Cid,
    Oidvector,
    Smgr,

    // Floating-Point
    Float4,
    Float8,

    // Arbitrary precision
    Numeric,

    // Date and time
    Abstime,
    Date,
    Time,
    Timestamp,
    Interval,
    Timetz,

    // Netezza extensions
    Stgeometry,
    Varbinary,
    Unkbinary,

    // JSON
    Json,
    Jsonb,
    Jsonpath,

    // A type without a dedicated codec; surfaced as its raw wire bytes.
    Unknown,

    // Nested
    Array,
    Range,
    Domain,
    Record,
}

impl NzTypeId {
    /// Every kind, in catalog order. The nested kinds are only included when `nested` is set.
    pub fn all(nested: bool) -> Vec<NzTypeId> {
        use NzTypeId::*;

        let mut out = vec![
            Bool, Bytea, Char, Name, Int8, Int2, Int2vector, Int4, Regproc, Text, Oid, Tid,
            Xid, Cid, Oidvector, Smgr, Float4, Float8, Abstime, Unknown, Bpchar, Varchar, Date,
            Time, Timestamp, Interval, Timetz, Numeric, Int1, Nchar, Nvarchar, Stgeometry,
            Varbinary, Unkbinary, Json, Jsonb, Jsonpath,
        ];

        if nested {
            out.extend([Array, Record, Range, Domain]);
        }

        out
    }

    /// The name of the receive function (`TYPRECEIVE` in `_T_TYPE`) that identifies this kind.
    #[must_use]
    pub const fn typreceive(self) -> &'static str {
        use NzTypeId::*;

        match self {
            Bool => "BOOLIN",
            Bytea => "BYTEAIN",
            Char => "CHARIN",
            Name => "NAMEIN",
            Int8 => "INT8IN",
            Int2 => "INT2IN",
            Int2vector => "INT2VECTORIN",
            Int4 => "INT4IN",
            Regproc => "REGPROCIN",
            Text | Unknown => "TEXTIN",
            Oid => "OIDIN",
            Tid => "TIDIN",
            Xid => "XIDIN",
            Cid => "CIDIN",
            Oidvector => "OIDVECTORIN",
            Smgr => "SMGRIN",
            Float4 => "FLOAT4IN",
            Float8 => "FLOAT8IN",
            Abstime => "NABSTIMEIN",
            Bpchar => "BPCHARIN",
            Varchar => "VARCHARIN",
            Date => "DATE_IN",
            Time => "TIME_IN",
            Timestamp => "TIMESTAMP_IN",
            Interval => "INTERVAL_IN",
            Timetz => "TIMETZ_IN",
            Numeric => "NUMERIC_IN",
            Int1 => "INT1IN",
            Nchar => "NCHARIN",
            Nvarchar => "NVARCHARIN",
            Stgeometry => "GEOMETRYIN",
            Varbinary | Unkbinary => "VARBINARYIN",
            Json => "JSON_IN",
            Jsonb => "JSONB_IN",
            Jsonpath => "JSONPATH_IN",

            Array => "ARRAY_RECV",
            Range => "RANGE_RECV",
            Domain => "DOMAIN_RECV",
            Record => "RECORD_RECV",
        }
    }

    /// A likely `TYPNAME` for this kind. Useful for tests and messages; the catalog may
    /// hold a different name.
    #[must_use]
    pub const fn typname(self) -> &'static str {
        use NzTypeId::*;

        match self {
            Bool => "BOOL",
            Bytea => "BYTEA",
            Char => "CHAR",
            Name => "NAME",
            Int8 => "INT8",
            Int2 => "INT2",
            Int2vector => "INT2VECTOR",
            Int4 => "INT4",
            Regproc => "REGPROC",
            Text => "TEXT",
            Oid => "OID",
            Tid => "TID",
            Xid => "XID",
            Cid => "CID",
            Oidvector => "OIDVECTOR",
            Smgr => "SMGR",
            Float4 => "FLOAT4",
            Float8 => "FLOAT8",
            Abstime => "ABSTIME",
            Unknown => "UNKNOWN",
            Bpchar => "BPCHAR",
            Varchar => "VARCHAR",
            Date => "DATE",
            Time => "TIME",
            Timestamp => "TIMESTAMP",
            Interval => "INTERVAL",
            Timetz => "TIMETZ",
            Numeric => "NUMERIC",
            Int1 => "INT1",
            Nchar => "NCHAR",
            Nvarchar => "NVARCHAR",
            Stgeometry => "ST_GEOMETRY",
            Varbinary => "VARBINARY",
            Unkbinary => "UNKBINARY",
            Json => "JSON",
            Jsonb => "JSONB",
            Jsonpath => "JSONBPATH",

            Array => "ARRAY",
            Range => "RANGE",
            Domain => "DOMAIN",
            Record => "RECORD",
        }
    }

    /// The OID Netezza assigns to this kind out of the box, if it has one.
    #[must_use]
    pub const fn builtin_oid(self) -> Option<u32> {
        use NzTypeId::*;

        Some(match self {
            Bool => 16,
            Bytea => 17,
            Char => 18,
            Name => 19,
            Int8 => 20,
            Int2 => 21,
            Int2vector => 22,
            Int4 => 23,
            Regproc => 24,
            Text => 25,
            Oid => 26,
            Tid => 27,
            Xid => 28,
            Cid => 29,
            Oidvector => 30,
            Smgr => 210,
            Float4 => 701,
            Float8 => 702,
            Abstime => 703,
            Unknown => 705,
            Bpchar => 1042,
            Varchar => 1043,
            Date => 1082,
            Time => 1083,
            Timestamp => 1084,
            Interval => 1186,
            Timetz => 1266,
            Numeric => 1700,
            Int1 => 2500,
            Nchar => 2522,
            Nvarchar => 2530,
            Stgeometry => 2552,
            Varbinary => 2568,
            Unkbinary => 2569,
            Json => 2652,
            Jsonb => 2653,
            Jsonpath => 2654,

            Array | Range | Domain | Record => return None,
        })
    }

    /// Looks up the kind decoded by a receive function, ignoring ASCII case.
    ///
    /// Where two kinds share a receive function the one listed first in [`NzTypeId::all`]
    /// wins (`TEXTIN` is `Text`, `VARBINARYIN` is `Varbinary`).
    pub fn from_typreceive(typreceive: &str) -> Option<NzTypeId> {
        NzTypeId::all(true)
            .into_iter()
            .find(|id| id.typreceive().eq_ignore_ascii_case(typreceive))
    }

    /// Returns `true` for the kinds whose values are built from other types.
    #[must_use]
    pub const fn is_nested(self) -> bool {
        matches!(
            self,
            NzTypeId::Array | NzTypeId::Range | NzTypeId::Domain | NzTypeId::Record
        )
    }
}
