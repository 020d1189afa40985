//! Cultural-background categories and the static reference table embedded in prompts.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CulturalBackground {
    EastAsian,
    SouthAsian,
    SoutheastAsian,
    LatinAmerican,
    African,
    AfricanAmerican,
    MiddleEastern,
    Indigenous,
    European,
    General,
}

/// Reference entry: what a counselor should keep in mind for a background.
#[derive(Debug, Clone, Copy)]
pub struct CulturalReference {
    pub label: &'static str,
    pub common_factors: &'static [&'static str],
    pub sensitivities: &'static [&'static str],
    pub strengths: &'static [&'static str],
}

impl CulturalBackground {
    /// Lenient parse of a free-form cultural context tag. Unknown tags map to `General`.
    pub fn from_context(tag: &str) -> Self {
        let norm: String = tag
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        match norm.as_str() {
            "east-asian" | "eastasian" => Self::EastAsian,
            "south-asian" | "southasian" => Self::SouthAsian,
            "southeast-asian" | "south-east-asian" => Self::SoutheastAsian,
            "latin-american" | "latino" | "latina" | "latinx" | "hispanic" => Self::LatinAmerican,
            "african" => Self::African,
            "african-american" | "black" => Self::AfricanAmerican,
            "middle-eastern" | "arab" => Self::MiddleEastern,
            "indigenous" | "native" | "first-nations" => Self::Indigenous,
            "european" => Self::European,
            _ => Self::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EastAsian => "east-asian",
            Self::SouthAsian => "south-asian",
            Self::SoutheastAsian => "southeast-asian",
            Self::LatinAmerican => "latin-american",
            Self::African => "african",
            Self::AfricanAmerican => "african-american",
            Self::MiddleEastern => "middle-eastern",
            Self::Indigenous => "indigenous",
            Self::European => "european",
            Self::General => "general",
        }
    }

    pub fn reference(&self) -> &'static CulturalReference {
        match self {
            Self::EastAsian => &EAST_ASIAN,
            Self::SouthAsian => &SOUTH_ASIAN,
            Self::SoutheastAsian => &SOUTHEAST_ASIAN,
            Self::LatinAmerican => &LATIN_AMERICAN,
            Self::African => &AFRICAN,
            Self::AfricanAmerican => &AFRICAN_AMERICAN,
            Self::MiddleEastern => &MIDDLE_EASTERN,
            Self::Indigenous => &INDIGENOUS,
            Self::European => &EUROPEAN,
            Self::General => &GENERAL,
        }
    }
}

impl fmt::Display for CulturalBackground {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static EAST_ASIAN: CulturalReference = CulturalReference {
    label: "East Asian",
    common_factors: &[
        "collectivist family orientation",
        "filial piety and respect for elders",
        "emphasis on academic and career achievement",
        "indirect communication style",
    ],
    sensitivities: &[
        "stigma around mental health help-seeking",
        "concern about losing face or bringing shame to family",
        "somatic expression of emotional distress",
    ],
    strengths: &[
        "strong family support networks",
        "resilience and perseverance",
        "value placed on harmony and balance",
    ],
};

static SOUTH_ASIAN: CulturalReference = CulturalReference {
    label: "South Asian",
    common_factors: &[
        "extended family involvement in decisions",
        "religious and spiritual frameworks",
        "intergenerational expectations on marriage and career",
    ],
    sensitivities: &[
        "family honor and community reputation",
        "gender role expectations",
        "reluctance to discuss family conflict with outsiders",
    ],
    strengths: &[
        "close-knit community ties",
        "spiritual coping resources",
        "strong sense of duty and commitment",
    ],
};

static SOUTHEAST_ASIAN: CulturalReference = CulturalReference {
    label: "Southeast Asian",
    common_factors: &[
        "collectivist values and group harmony",
        "migration and refugee histories in some families",
        "respect for hierarchy and authority",
    ],
    sensitivities: &[
        "intergenerational trauma",
        "language barriers within families",
        "avoidance of direct confrontation",
    ],
    strengths: &[
        "adaptability",
        "community mutual aid",
        "spiritual and religious practices",
    ],
};

static LATIN_AMERICAN: CulturalReference = CulturalReference {
    label: "Latin American",
    common_factors: &[
        "familismo: family as primary support",
        "personalismo: warmth in relationships",
        "religious faith as a coping resource",
    ],
    sensitivities: &[
        "immigration-related stress",
        "machismo and marianismo expectations",
        "distrust of formal institutions",
    ],
    strengths: &[
        "strong family loyalty",
        "expressive emotional communication",
        "community solidarity",
    ],
};

static AFRICAN: CulturalReference = CulturalReference {
    label: "African",
    common_factors: &[
        "communal identity and extended kinship",
        "respect for elders and tradition",
        "spiritual worldviews linking community and wellbeing",
    ],
    sensitivities: &[
        "stigma of mental illness",
        "acculturation stress for diaspora families",
        "traditional healing practices alongside clinical care",
    ],
    strengths: &[
        "ubuntu: interconnectedness",
        "oral tradition and storytelling",
        "collective resilience",
    ],
};

static AFRICAN_AMERICAN: CulturalReference = CulturalReference {
    label: "African American",
    common_factors: &[
        "church and faith communities",
        "extended and chosen family",
        "historical and ongoing experiences of racism",
    ],
    sensitivities: &[
        "mistrust of healthcare systems rooted in history",
        "racial trauma and microaggressions",
        "pressure to appear strong",
    ],
    strengths: &[
        "community resilience",
        "spiritual coping",
        "strong kinship bonds",
    ],
};

static MIDDLE_EASTERN: CulturalReference = CulturalReference {
    label: "Middle Eastern",
    common_factors: &[
        "family honor and collective identity",
        "religious observance",
        "hospitality and relational obligations",
    ],
    sensitivities: &[
        "discrimination and stereotyping",
        "gender norms in help-seeking",
        "war and displacement histories",
    ],
    strengths: &[
        "family cohesion",
        "faith-based meaning making",
        "generosity and community support",
    ],
};

static INDIGENOUS: CulturalReference = CulturalReference {
    label: "Indigenous",
    common_factors: &[
        "connection to land and ancestry",
        "holistic view of wellbeing",
        "community and elder guidance",
    ],
    sensitivities: &[
        "historical and intergenerational trauma",
        "colonial harm by institutions",
        "cultural disconnection",
    ],
    strengths: &[
        "traditional healing practices",
        "strong cultural identity",
        "community ceremonies and belonging",
    ],
};

static EUROPEAN: CulturalReference = CulturalReference {
    label: "European",
    common_factors: &[
        "individual autonomy",
        "direct communication",
        "secular or varied religious backgrounds",
    ],
    sensitivities: &[
        "regional and migrant identity differences",
        "reserve about emotional disclosure in some cultures",
    ],
    strengths: &[
        "familiarity with formal support services",
        "value placed on self-reflection",
    ],
};

static GENERAL: CulturalReference = CulturalReference {
    label: "General",
    common_factors: &[
        "individual cultural identity may blend several backgrounds",
        "family and community context varies widely",
    ],
    sensitivities: &[
        "avoid assumptions based on appearance or name",
        "ask about cultural values rather than infer them",
    ],
    strengths: &[
        "the requester's own description of what helps",
        "personal support networks",
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_context_is_lenient() {
        assert_eq!(
            CulturalBackground::from_context("east-asian"),
            CulturalBackground::EastAsian
        );
        assert_eq!(
            CulturalBackground::from_context(" East_Asian "),
            CulturalBackground::EastAsian
        );
        assert_eq!(
            CulturalBackground::from_context("Hispanic"),
            CulturalBackground::LatinAmerican
        );
        assert_eq!(
            CulturalBackground::from_context("martian"),
            CulturalBackground::General
        );
    }

    #[test]
    fn test_every_background_has_entries() {
        use CulturalBackground::*;
        for bg in [
            EastAsian,
            SouthAsian,
            SoutheastAsian,
            LatinAmerican,
            African,
            AfricanAmerican,
            MiddleEastern,
            Indigenous,
            European,
            General,
        ] {
            let r = bg.reference();
            assert!(!r.common_factors.is_empty(), "{bg}");
            assert!(!r.sensitivities.is_empty(), "{bg}");
            assert!(!r.strengths.is_empty(), "{bg}");
            assert_eq!(CulturalBackground::from_context(bg.as_str()), bg);
        }
    }
}
