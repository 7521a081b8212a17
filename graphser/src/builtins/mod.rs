//! The built-in codec set (serializer ids 0-7).
//!
//! | id | codec | final |
//! |----|-------------|-------|
//! | 0  | opaque | yes |
//! | 1  | primitive | yes |
//! | 2  | bytes | yes |
//! | 3  | text | yes |
//! | 4  | tuple | no |
//! | 5  | list | no |
//! | 6  | map | no |
//! | 7  | placeholder | yes |
//!
//! Ids 1, 2, 3, 4, 5 and 6 are ordinary [`crate::codec::Codec`] impls,
//! statically dispatched on the `Value` variant in `crate::driver`. Ids 0
//! and 7 have no fixed wire shape tied to a `Value` variant (0 depends on
//! whatever the registry resolves to; 7 only ever appears as a stand-in
//! the driver itself emits) so they are plain helper functions instead.
pub mod bytes_codec;
pub mod collection;
pub mod mapping;
pub mod opaque;
pub mod placeholder;
pub mod primitive;
pub mod text;

pub use bytes_codec::BytesCodec;
pub use collection::{ListCodec, TupleCodec};
pub use mapping::MappingCodec;
pub use primitive::PrimitiveCodec;
pub use text::TextCodec;
