//! Script generation with a deterministic local fallback.

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::TextBackend;
use crate::types::{GeneratedText, TextSource, Topic};

/// Number of `[IMAGE_PROMPT: ...]` markers in the fallback script.
pub const FALLBACK_IMAGE_PROMPTS: usize = 7;

/// Produces the script for a topic. Never fails: any backend problem yields the
/// fallback script instead.
#[derive(Clone)]
pub struct TextGenerator {
    backend: Option<Arc<dyn TextBackend>>,
}

impl TextGenerator {
    pub fn new(backend: Arc<dyn TextBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Generator with no backend; always returns the fallback script.
    pub fn offline() -> Self {
        Self { backend: None }
    }

    pub async fn generate(&self, topic: &Topic) -> GeneratedText {
        let Some(backend) = &self.backend else {
            info!(topic = %topic, "No text backend configured, using fallback script");
            return fallback_text(topic);
        };

        let prompt = instruction_prompt(topic);
        match backend.complete(&prompt).await {
            Ok(body) => match GeneratedText::new(body, TextSource::Backend) {
                Some(text) => {
                    info!(
                        topic = %topic,
                        backend = backend.name(),
                        chars = text.as_str().len(),
                        "Generated script from text backend"
                    );
                    text
                }
                None => {
                    warn!(backend = backend.name(), "Text backend returned empty text, using fallback");
                    fallback_text(topic)
                }
            },
            Err(err) => {
                warn!(
                    topic = %topic,
                    backend = backend.name(),
                    error = %err,
                    "Text generation failed, using fallback script"
                );
                fallback_text(topic)
            }
        }
    }
}

/// The instruction sent to the text backend.
pub fn instruction_prompt(topic: &Topic) -> String {
    format!(
        "Create comprehensive content about: {topic}

Please include the following sections:
1. Introduction and overview
2. Key concepts and definitions
3. Main benefits or applications
4. Step-by-step guide or process
5. Tips and best practices
6. Common challenges and solutions
7. Future trends and developments
8. Conclusion

Also, please include 3 image generation prompts in the following format:
[IMAGE_PROMPT: detailed description for image 1]
[IMAGE_PROMPT: detailed description for image 2]
[IMAGE_PROMPT: detailed description for image 3]

Make the content informative, engaging, and well-structured."
    )
}

fn fallback_text(topic: &Topic) -> GeneratedText {
    GeneratedText::fallback(fallback_script(topic))
}

/// Fixed short-video script for a topic: hook, five facts, outro, one image prompt
/// per visual beat, title, description and hashtags. Pure function of the topic.
pub fn fallback_script(topic: &Topic) -> String {
    let upper = topic.as_str().to_uppercase();
    let slug = topic.slug();
    format!(
        "🧠 **VIDEO SCRIPT: 5 Interesting and Unknown Facts About {topic}**

**HOOK (0-10 seconds):**
\"You think you know {topic}? Think again! Here are 5 mind-blowing facts that will change everything you thought you knew!\"

**FACT 1:**
Did you know that {topic} has some incredibly surprising origins? Most people have no idea about this fascinating backstory. This little-known detail will completely shift your perspective on {topic}.

**FACT 2:**
Here's something that will blow your mind about {topic}. Scientists recently discovered something amazing that challenges everything we thought we knew. This discovery has completely revolutionized our understanding.

**FACT 3:**
The most shocking thing about {topic}? It's connected to something you'd never expect! This incredible connection shows just how mysterious and fascinating {topic} really is.

**FACT 4:**
You won't believe this crazy fact about {topic}. It's so unbelievable that when researchers first discovered it, they thought it was a mistake! But it turns out to be absolutely true.

**FACT 5:**
And finally, here's the most mind-bending fact of all. {topic} has this incredible ability that sounds like science fiction but is completely real. This will leave you questioning everything!

**OUTRO:**
\"Which fact shocked you the most? Drop it in the comments and follow for more incredible facts that will blow your mind!\"

🖼️ **AI IMAGE GENERATION PROMPTS:**

[IMAGE_PROMPT: Cinematic 9:16 vertical shot of a person with shocked expression, dramatic lighting, colorful background with question marks floating, YouTube Shorts style thumbnail, hyper-realistic, vibrant colors]

[IMAGE_PROMPT: Dynamic 9:16 vertical illustration showing {topic} with mysterious glowing effects, cinematic composition, dramatic lighting, detailed and colorful, science fiction aesthetic]

[IMAGE_PROMPT: Stunning 9:16 vertical visualization of {topic} with futuristic elements, neon colors, high-tech background, cinematic depth of field, visually striking composition]

[IMAGE_PROMPT: Dramatic 9:16 vertical scene depicting {topic} in an unexpected context, cinematic lighting, vibrant colors, detailed environment, surprising visual elements]

[IMAGE_PROMPT: Eye-catching 9:16 vertical image of {topic} with scientific elements, glowing effects, modern design, colorful background, high detail and contrast]

[IMAGE_PROMPT: Amazing 9:16 vertical composition showing the incredible nature of {topic}, cinematic style, brilliant colors, detailed textures, visually stunning effects]

[IMAGE_PROMPT: Engaging 9:16 vertical image with excited person pointing at {topic}, bright colors, dynamic composition, YouTube Shorts style, call-to-action elements]

🎬 **YOUTUBE SHORTS TITLE:**
\"5 SHOCKING {upper} Facts That Will Blow Your Mind! 🤯\"

📄 **VIDEO DESCRIPTION:**
Discover 5 incredible and unknown facts about {topic} that will completely change how you see it! These surprising discoveries will leave you amazed and wanting more.

Follow for more mind-blowing facts and amazing discoveries! 🚀

🏷️ **META TAGS / HASHTAGS:**
#shorts #{slug}facts #{slug}shorts #{slug}trivia #didyouknow #amazingfacts #mindblowing #shocking #incredible #science #discovery #educational #viral #trending #curiousfacts #unbelievable
"
    )
}
