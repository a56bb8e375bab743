mod eq;
mod error;
mod json;
pub mod logging;
mod pass;
mod reflect;
mod tensor;
mod value;

pub use eq::{first_structural_mismatch, structural_equal, AccessPath, AccessStep};
pub use error::GraphError;
pub use json::{load_json, save_json, JsonGraph, JsonNode, NodeIndexer};
pub use pass::{
    create_unit_pass, lookup_option, ConfigOption, ConfigTag, Module, PassContext, PassInfo,
    UnitPass, UnitTransform, PASS_CONFIG_OPTIONS,
};
pub use reflect::{
    info, info_for, register, CreateInitFn, FieldGetter, FieldInfo, FieldSetter, ReprBytesFn,
    StaticTag, StructuralKind, TypeInfo, FIELD_SEQ_HASH_DEF, FIELD_SEQ_HASH_IGNORE,
};
pub use tensor::{numel, DataType, DataTypeCode, Device, DeviceType, NDArray, NDArrayData, Shape};
pub use value::{
    ArrayRef, MapRef, ObjectData, ObjectRef, Value, ValueKey, ValueMap, ARRAY_TYPE_KEY,
    BOOL_TYPE_KEY, BYTES_TYPE_KEY, DATATYPE_TYPE_KEY, DEVICE_TYPE_KEY, FLOAT_TYPE_KEY,
    INT_TYPE_KEY, MAP_TYPE_KEY, NDARRAY_TYPE_KEY, SHAPE_TYPE_KEY, STR_TYPE_KEY,
};
