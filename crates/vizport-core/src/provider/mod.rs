//! Provider seam between the gateway and concrete generation backends.

mod generate;

pub use generate::{
    GenerateFuture, GenerateParameters, StreamingTextProvider, TextGenerationProvider, TextStream,
};
