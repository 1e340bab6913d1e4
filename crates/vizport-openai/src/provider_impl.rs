use std::sync::Arc;

use futures_util::StreamExt;
use vizport_core::{
    error::VizportError,
    provider::{
        GenerateFuture, GenerateParameters, StreamingTextProvider, TextGenerationProvider,
        TextStream,
    },
};

use crate::{
    OpenAiAdapter,
    api_v1::{ChatCompletionRequest, FinishReason},
    error::OpenAiError,
};

impl TextGenerationProvider for OpenAiAdapter {
    fn generate(&self, params: GenerateParameters) -> GenerateFuture<'_> {
        let client = Arc::clone(&self.client);

        Box::pin(async move {
            let request = ChatCompletionRequest::try_from(params)?;
            let mut response = client.chat_completion(request).await?;

            if response.choices.is_empty() {
                return Err(OpenAiError::Format("response has no choices".into()).into());
            }
            let first_choice = response.choices.swap_remove(0);

            match first_choice.finish_reason {
                Some(FinishReason::ContentFilter) => {
                    return Err(
                        OpenAiError::Format("completion was blocked by content filter".into())
                            .into(),
                    );
                }
                Some(FinishReason::Length) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(model = %response.model, "completion truncated at token limit");
                }
                _ => {}
            }

            Ok(first_choice.message.content.unwrap_or_default())
        })
    }
}

impl StreamingTextProvider for OpenAiAdapter {
    fn generate_stream(&self, params: GenerateParameters) -> TextStream<'_> {
        let client = Arc::clone(&self.client);

        Box::pin(async_stream::try_stream! {
            let request = ChatCompletionRequest::try_from(params)?;

            let stream = client.chat_completion_stream(request);
            futures_util::pin_mut!(stream);

            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(VizportError::from)?;

                for choice in chunk.choices {
                    if choice.index != 0 {
                        continue;
                    }

                    if let Some(delta) = choice.delta.content
                        && !delta.is_empty()
                    {
                        yield delta;
                    }

                    match choice.finish_reason {
                        Some(FinishReason::ContentFilter) => {
                            Err::<(), VizportError>(
                                OpenAiError::Format("completion was blocked by content filter".into())
                                    .into(),
                            )?;
                        }
                        Some(_) => return,
                        None => {}
                    }
                }
            }
        })
    }
}

