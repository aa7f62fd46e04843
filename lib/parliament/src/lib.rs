#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod error;
pub mod store;

pub mod model {
    pub use parliament_model::*;
}

pub mod common {
    pub use parliament_common::*;
}

pub mod index {
    pub use parliament_index::*;
}

pub mod temporal {
    pub use parliament_temporal::*;
}

pub mod logical {
    pub use parliament_logical::*;
}

pub mod engine {
    pub use parliament_engine::*;
}

pub mod storage {
    pub use parliament_storage::*;
}
