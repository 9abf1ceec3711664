pub mod newtype_id;
