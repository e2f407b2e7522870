//! Localized prompt strings shown on the preview overlay.

/// Named prompts for one language.
#[derive(Debug, Clone, Copy)]
pub struct Prompts {
    pub smile_message: &'static str,
}

const EN: Prompts = Prompts {
    smile_message: "Smile !",
};

/// Look up the prompts for a language code, falling back to English when the
/// code is unknown.
pub fn prompts(language: &str) -> Prompts {
    match language {
        "en" => EN,
        "fr" => Prompts {
            smile_message: "Souriez !",
        },
        "de" => Prompts {
            smile_message: "Bitte lächeln !",
        },
        "es" => Prompts {
            smile_message: "¡Sonríe!",
        },
        "nl" => Prompts {
            smile_message: "Lach !",
        },
        "hu" => Prompts {
            smile_message: "Csíííz !",
        },
        _ => EN,
    }
}
