//! The closed catalogue of placeholder generators.

use mirage_core::TemplateError;
use mirage_deps::chrono::{DateTime, Duration, SecondsFormat, Utc};
use mirage_deps::rand::Rng as _;
use mirage_deps::rand::rngs::StdRng;
use mirage_deps::rand::seq::SliceRandom as _;
use mirage_deps::serde_json::Value;
use mirage_deps::uuid::Builder;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Dennis", "Edsger", "Frances", "Grace", "Hedy", "Ivan",
    "Jean", "Ken", "Linus", "Margaret", "Niklaus", "Radia", "Sophie", "Tim", "Ursula", "Yukihiro",
];

const LAST_NAMES: &[&str] = &[
    "Allen", "Bartik", "Cerf", "Dijkstra", "Engelbart", "Floyd", "Goldberg", "Hopper", "Kay",
    "Knuth", "Lamport", "Liskov", "Lovelace", "Perlman", "Ritchie", "Shannon", "Thompson",
    "Turing", "Wilson", "Wirth",
];

const LOREM_WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat",
];

const MAX_WORDS: u64 = 100;
const MAX_SENTENCES: u64 = 50;
const DEFAULT_RECENT_DAYS: u64 = 7;
const DEFAULT_INT_RANGE: (i64, i64) = (0, 1_000);

/// Inputs every generator draws from.
pub struct GenerationContext<'rng> {
    /// Session random source, locked for the duration of one expansion
    pub rng: &'rng mut StdRng,
    /// Instant that "recent" dates count back from
    pub anchor: DateTime<Utc>,
}

/// A generator in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    /// Random UUID string
    Uuid,
    /// "First Last"
    FullName,
    /// `first.last<n>@example.com`
    Email,
    /// Lorem ipsum sentence
    Sentence,
    /// Several lorem ipsum sentences
    Paragraph,
    /// RFC 3339 timestamp within the last few days
    RecentDate,
    /// Integer in an inclusive range
    Integer,
}

impl Generator {
    /// Resolve a placeholder name, with or without its namespace.
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "uuid" | "string.uuid" | "datatype.uuid" => Some(Self::Uuid),
            "fullName" | "person.fullName" | "name.fullName" => Some(Self::FullName),
            "email" | "internet.email" => Some(Self::Email),
            "sentence" | "lorem.sentence" => Some(Self::Sentence),
            "paragraph" | "lorem.paragraph" => Some(Self::Paragraph),
            "recentDate" | "date.recent" => Some(Self::RecentDate),
            "int" | "number.int" | "datatype.number" => Some(Self::Integer),
            _ => None,
        }
    }

    /// Canonical name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Self::Uuid => "string.uuid",
            Self::FullName => "person.fullName",
            Self::Email => "internet.email",
            Self::Sentence => "lorem.sentence",
            Self::Paragraph => "lorem.paragraph",
            Self::RecentDate => "date.recent",
            Self::Integer => "number.int",
        }
    }

    /// Produce one value.
    ///
    /// # Errors
    /// Returns `TemplateError::InvalidArguments` when `args` do not fit the generator.
    pub fn generate(
        self,
        args: &[String],
        ctx: &mut GenerationContext<'_>,
    ) -> Result<Value, TemplateError> {
        match self {
            Self::Uuid => {
                self.expect_no_args(args)?;
                let bytes: [u8; 16] = ctx.rng.r#gen();
                Ok(Value::String(
                    Builder::from_random_bytes(bytes).into_uuid().to_string(),
                ))
            }
            Self::FullName => {
                self.expect_no_args(args)?;
                let (first, last) = pick_name(ctx.rng);
                Ok(Value::String(format!("{first} {last}")))
            }
            Self::Email => {
                self.expect_no_args(args)?;
                let (first, last) = pick_name(ctx.rng);
                let suffix: u8 = ctx.rng.gen_range(1..100);
                Ok(Value::String(format!(
                    "{}.{}{suffix}@example.com",
                    first.to_ascii_lowercase(),
                    last.to_ascii_lowercase()
                )))
            }
            Self::Sentence => {
                let words = self.optional_count(args, 1, MAX_WORDS)?;
                let count = words.unwrap_or_else(|| ctx.rng.gen_range(4..=10));
                Ok(Value::String(sentence(ctx.rng, count)))
            }
            Self::Paragraph => {
                let sentences = self.optional_count(args, 1, MAX_SENTENCES)?;
                let count = sentences.unwrap_or_else(|| ctx.rng.gen_range(3..=5));
                let text = (0..count)
                    .map(|_| {
                        let words = ctx.rng.gen_range(4..=10);
                        sentence(ctx.rng, words)
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                Ok(Value::String(text))
            }
            Self::RecentDate => {
                let days = self
                    .optional_count(args, 1, 3_650)?
                    .unwrap_or(DEFAULT_RECENT_DAYS);
                let window_seconds = days.saturating_mul(86_400) as i64;
                let back = ctx.rng.gen_range(0..window_seconds);
                let instant = ctx.anchor - Duration::seconds(back);
                Ok(Value::String(
                    instant.to_rfc3339_opts(SecondsFormat::Secs, true),
                ))
            }
            Self::Integer => {
                let (min, max) = self.int_range(args)?;
                Ok(Value::from(ctx.rng.gen_range(min..=max)))
            }
        }
    }

    fn invalid(self, reason: impl Into<String>) -> TemplateError {
        TemplateError::InvalidArguments {
            generator: self.name().to_owned(),
            reason: reason.into(),
        }
    }

    fn expect_no_args(self, args: &[String]) -> Result<(), TemplateError> {
        if args.is_empty() {
            Ok(())
        } else {
            Err(self.invalid(format!("takes no arguments, got {}", args.len())))
        }
    }

    fn optional_count(
        self,
        args: &[String],
        min: u64,
        max: u64,
    ) -> Result<Option<u64>, TemplateError> {
        match args {
            [] => Ok(None),
            [single] => {
                let count = single
                    .parse::<u64>()
                    .map_err(|_| self.invalid(format!("{single:?} is not a count")))?;
                if (min..=max).contains(&count) {
                    Ok(Some(count))
                } else {
                    Err(self.invalid(format!("count must be between {min} and {max}")))
                }
            }
            _ => Err(self.invalid(format!("takes at most one argument, got {}", args.len()))),
        }
    }

    fn int_range(self, args: &[String]) -> Result<(i64, i64), TemplateError> {
        let parse = |text: &String| {
            text.parse::<i64>()
                .map_err(|_| self.invalid(format!("{text:?} is not an integer")))
        };
        let (min, max) = match args {
            [] => DEFAULT_INT_RANGE,
            [max] => (0, parse(max)?),
            [min, max] => (parse(min)?, parse(max)?),
            _ => {
                return Err(
                    self.invalid(format!("takes at most two arguments, got {}", args.len()))
                );
            }
        };
        if min > max {
            return Err(self.invalid(format!("min {min} is greater than max {max}")));
        }
        Ok((min, max))
    }
}

fn pick_name(rng: &mut StdRng) -> (&'static str, &'static str) {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Ada");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Lovelace");
    (first, last)
}

fn sentence(rng: &mut StdRng, words: u64) -> String {
    let mut text = (0..words)
        .map(|_| LOREM_WORDS.choose(rng).copied().unwrap_or("lorem"))
        .collect::<Vec<_>>()
        .join(" ");
    if let Some(first) = text.get(..1) {
        let upper = first.to_ascii_uppercase();
        text.replace_range(..1, &upper);
    }
    text.push('.');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirage_deps::chrono::TimeZone as _;
    use mirage_deps::rand::SeedableRng as _;
    use mirage_deps::uuid::Uuid;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn run(generator: Generator, args: &[&str]) -> Result<Value, TemplateError> {
        let mut rng = StdRng::seed_from_u64(5);
        let mut ctx = GenerationContext {
            rng: &mut rng,
            anchor: anchor(),
        };
        let owned: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
        generator.generate(&owned, &mut ctx)
    }

    #[test]
    fn test_lookup_accepts_namespaced_and_bare_names() {
        assert_eq!(Generator::lookup("uuid"), Some(Generator::Uuid));
        assert_eq!(Generator::lookup("string.uuid"), Some(Generator::Uuid));
        assert_eq!(Generator::lookup("person.fullName"), Some(Generator::FullName));
        assert_eq!(Generator::lookup("number.int"), Some(Generator::Integer));
        assert_eq!(Generator::lookup("person.shoeSize"), None);
        assert_eq!(Generator::lookup("UUID"), None);
    }

    #[test]
    fn test_uuid_is_parseable() {
        let value = run(Generator::Uuid, &[]).unwrap();
        let text = value.as_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());
    }

    #[test]
    fn test_integer_respects_range_and_type() {
        for _ in 0..20 {
            let value = run(Generator::Integer, &["3", "5"]).unwrap();
            let number = value.as_i64().unwrap();
            assert!((3..=5).contains(&number));
        }
        assert!(run(Generator::Integer, &["9", "1"]).is_err());
        assert!(run(Generator::Integer, &["x"]).is_err());
    }

    #[test]
    fn test_sentence_word_count() {
        let value = run(Generator::Sentence, &["6"]).unwrap();
        let text = value.as_str().unwrap();
        assert_eq!(text.split(' ').count(), 6);
        assert!(text.ends_with('.'));
        assert!(text.chars().next().is_some_and(|ch| ch.is_ascii_uppercase()));
    }

    #[test]
    fn test_recent_date_is_before_anchor() {
        let value = run(Generator::RecentDate, &["2"]).unwrap();
        let parsed = DateTime::parse_from_rfc3339(value.as_str().unwrap()).unwrap();
        let parsed_utc = parsed.with_timezone(&Utc);
        assert!(parsed_utc <= anchor());
        assert!(parsed_utc > anchor() - Duration::days(2));
    }

    #[test]
    fn test_email_shape() {
        let value = run(Generator::Email, &[]).unwrap();
        let text = value.as_str().unwrap();
        assert!(text.ends_with("@example.com"));
        assert!(text.contains('.'));
    }

    #[test]
    fn test_argument_errors_name_the_generator() {
        let err = run(Generator::Uuid, &["1"]).unwrap_err();
        assert_eq!(
            err,
            TemplateError::InvalidArguments {
                generator: "string.uuid".to_owned(),
                reason: "takes no arguments, got 1".to_owned(),
            }
        );
        assert!(run(Generator::Paragraph, &["0"]).is_err());
    }
}
