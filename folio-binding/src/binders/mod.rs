//! Built-in model binders

mod body;
mod byte_array;
mod collection;
mod complex;
mod dictionary;
mod form_file;
mod header;
mod key_value;
mod services;
mod simple;

pub use body::BodyModelBinder;
pub use byte_array::ByteArrayModelBinder;
pub use collection::CollectionModelBinder;
pub use complex::ComplexTypeModelBinder;
pub use dictionary::DictionaryModelBinder;
pub use form_file::FormFileModelBinder;
pub use header::HeaderModelBinder;
pub use key_value::KeyValuePairModelBinder;
pub use services::ServicesModelBinder;
pub use simple::SimpleTypeModelBinder;
