use logos::{Lexer, Logos};
use std::{fmt, str::FromStr, time};
use thiserror::Error;

/// Human readable [`std::time::Duration`].
///
/// Displays as a sum of seconds, milliseconds and microseconds
/// (`"1s542ms"`) and parses any sequence of `<number><unit>` pairs,
/// optionally separated by whitespace (`"1s 2000ms 3000000us"`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub(crate) struct Duration(time::Duration);

/// Error returned when parsing a human readable duration fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("Cannot parse an empty duration")]
    Empty,
    #[error("Unexpected `{token}' at offset {offset} in `{input}'")]
    UnexpectedToken {
        input: String,
        token: String,
        offset: usize,
    },
    #[error("Expecting a unit (ns, us, ms, s, m) after `{value}' in `{input}'")]
    MissingUnit { input: String, value: u64 },
    #[error("Duration `{input}' is too large")]
    Overflow { input: String },
}

impl Duration {
    pub(crate) fn new(dur: time::Duration) -> Self {
        Self(dur)
    }

    #[inline]
    pub(crate) fn into_duration(self) -> time::Duration {
        self.0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        let millis = self.0.subsec_millis();
        let micros = self.0.subsec_micros() % 1_000;

        if secs == 0 && millis == 0 && micros == 0 {
            return f.write_str("0ms");
        }

        if secs > 0 {
            write!(f, "{secs}s")?;
        }
        if millis > 0 {
            write!(f, "{millis}ms")?;
        }
        if micros > 0 {
            write!(f, "{micros}µs")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lex = Lexer::<Token>::new(s);
        let mut total = time::Duration::ZERO;
        let mut seen = false;

        let unexpected = |lex: &Lexer<Token>| DurationParseError::UnexpectedToken {
            input: s.to_owned(),
            token: lex.slice().to_owned(),
            offset: lex.span().start,
        };
        let overflow = || DurationParseError::Overflow {
            input: s.to_owned(),
        };

        while let Some(next) = lex.next() {
            let Ok(Token::Value) = next else {
                return Err(unexpected(&lex));
            };
            let number: u64 = lex.slice().parse().map_err(|_| overflow())?;

            let duration = match lex.next() {
                Some(Ok(Token::NanoSeconds)) => time::Duration::from_nanos(number),
                Some(Ok(Token::MicroSeconds)) => time::Duration::from_micros(number),
                Some(Ok(Token::MilliSeconds)) => time::Duration::from_millis(number),
                Some(Ok(Token::Seconds)) => time::Duration::from_secs(number),
                Some(Ok(Token::Minutes)) => {
                    time::Duration::from_secs(number.checked_mul(60).ok_or_else(overflow)?)
                }
                Some(Ok(Token::Value)) | Some(Err(())) => return Err(unexpected(&lex)),
                None => {
                    return Err(DurationParseError::MissingUnit {
                        input: s.to_owned(),
                        value: number,
                    });
                }
            };

            total = total.checked_add(duration).ok_or_else(overflow)?;
            seen = true;
        }

        if seen {
            Ok(Self(total))
        } else {
            Err(DurationParseError::Empty)
        }
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")]
enum Token {
    #[token("ns")]
    NanoSeconds,
    #[regex("us|µs|μs")]
    MicroSeconds,
    #[token("ms")]
    MilliSeconds,
    #[token("s")]
    Seconds,
    #[token("m")]
    Minutes,

    #[regex("[0-9]+")]
    Value,
}
