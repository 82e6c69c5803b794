// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Versioned string serialization.
//!
//! A serialized value is `version|payload`. The version picks the
//! serializer that understands the payload, so old strings keep loading
//! after the format changes.

use std::collections::HashMap;
use std::fmt;

use super::Score;
use crate::error::{Error, Result};
use crate::music::{ChordDictionary, NamedChord, Note};
use crate::sequencer::{format_number, parse_beats, NoteGroup, TimedNote};

/// Separates the version from the payload
const VERSION_SEPARATOR: char = '|';
/// Decimal places for beats in a serialized score
const SERIALIZER_PRECISION: usize = 6;

/// One version of a string format for `T`
pub trait VersionedSerializer<T>: Send + Sync {
    /// Tag written in front of the payload. Must be non-empty and free of `|`.
    fn version(&self) -> &str;

    fn serialize(&self, object: &T) -> Result<String>;

    fn deserialize(&self, s: &str) -> Result<T>;

    /// Replace `object` with the deserialized value, leaving it untouched
    /// on failure
    fn deserialize_into(&self, s: &str, object: &mut T) -> Result<()> {
        *object = self.deserialize(s)?;
        Ok(())
    }
}

/// Serializers keyed by version, with a default for writing
pub struct SerializationDictionary<T> {
    serializers: HashMap<String, Box<dyn VersionedSerializer<T>>>,
    default_version: String,
}

impl<T> SerializationDictionary<T> {
    pub fn new(
        serializers: Vec<Box<dyn VersionedSerializer<T>>>,
        default_version: impl Into<String>,
    ) -> Result<Self> {
        let mut map = HashMap::new();
        for serializer in serializers {
            let version = serializer.version().to_string();
            if version.is_empty() {
                return Err(Error::InvalidVersion("no version set for serializer".into()));
            }
            if version.contains(VERSION_SEPARATOR) {
                return Err(Error::InvalidVersion(format!(
                    "version {:?} cannot contain '{}'",
                    version, VERSION_SEPARATOR
                )));
            }
            map.insert(version, serializer);
        }
        Ok(Self {
            serializers: map,
            default_version: default_version.into(),
        })
    }

    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    /// Every registered version, sorted
    pub fn versions(&self) -> Vec<&str> {
        let mut versions: Vec<&str> = self.serializers.keys().map(String::as_str).collect();
        versions.sort_unstable();
        versions
    }

    /// Serializer for `version`, or the default one
    pub fn get(&self, version: Option<&str>) -> Option<&dyn VersionedSerializer<T>> {
        let version = version.unwrap_or(&self.default_version);
        self.serializers.get(version).map(|s| s.as_ref())
    }

    pub fn serialize(&self, object: &T, version: Option<&str>) -> Result<String> {
        let version = version.unwrap_or(&self.default_version);
        let serializer = self
            .get(Some(version))
            .ok_or_else(|| Error::UnknownVersion(version.to_string()))?;
        Ok(format!(
            "{}{}{}",
            version,
            VERSION_SEPARATOR,
            serializer.serialize(object)?
        ))
    }

    /// Deserialize with the serializer named in the string
    pub fn deserialize(&self, s: &str) -> Result<T> {
        let (serializer, payload) = self.split(s)?;
        serializer.deserialize(payload)
    }

    pub fn deserialize_into(&self, s: &str, object: &mut T) -> Result<()> {
        let (serializer, payload) = self.split(s)?;
        serializer.deserialize_into(payload, object)
    }

    fn split<'a>(&self, s: &'a str) -> Result<(&dyn VersionedSerializer<T>, &'a str)> {
        let (version, payload) = s
            .split_once(VERSION_SEPARATOR)
            .ok_or_else(|| Error::Deserialization("no version number could be inferred".into()))?;
        let serializer = self
            .get(Some(version))
            .ok_or_else(|| Error::UnknownVersion(version.to_string()))?;
        Ok((serializer, payload))
    }
}

impl<T> fmt::Debug for SerializationDictionary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationDictionary")
            .field("versions", &self.versions())
            .field("default_version", &self.default_version)
            .finish()
    }
}

/// First score format.
///
/// `E4-m|F4-maj7~D4-0-1|A4-1-1.5`: chords as `root-suffix`, then `~`, then
/// notes as `note-start-end`. Sharps are written `_` so the string can sit
/// in a URL.
#[derive(Debug, Clone)]
pub struct ScoreSerializerV0 {
    chord_dictionary: ChordDictionary,
}

impl ScoreSerializerV0 {
    pub const VERSION: &'static str = "v0";

    pub fn new(chord_dictionary: ChordDictionary) -> Self {
        Self { chord_dictionary }
    }

    fn parse_chord(&self, s: &str) -> Result<NamedChord> {
        self.chord_dictionary
            .get_chord_by_name(s)?
            .ok_or_else(|| Error::UnknownChordSuffix(s.to_string()))
    }

    fn parse_note(s: &str) -> Result<TimedNote> {
        // Negative octaves carry their own '-', so split from the right
        let mut parts = s.rsplitn(3, '-');
        let (Some(end), Some(start), Some(note)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::Deserialization(format!(
                "expected note-start-end but got {:?}",
                s
            )));
        };
        Ok(TimedNote::new(
            Note::parse(note)?,
            parse_beats(start)?,
            parse_beats(end)?,
        ))
    }
}

impl VersionedSerializer<Score> for ScoreSerializerV0 {
    fn version(&self) -> &str {
        Self::VERSION
    }

    fn serialize(&self, score: &Score) -> Result<String> {
        let chords: Vec<String> = score
            .chords
            .iter()
            .map(|chord| format!("{}-{}", chord.root, chord.suffix))
            .collect();
        let notes: Vec<String> = score
            .notes
            .iter()
            .map(|n| {
                format!(
                    "{}-{}-{}",
                    n.note,
                    format_number(n.start, SERIALIZER_PRECISION),
                    format_number(n.end, SERIALIZER_PRECISION)
                )
            })
            .collect();
        Ok(format!("{}~{}", chords.join("|"), notes.join("|")).replace('#', "_"))
    }

    fn deserialize(&self, s: &str) -> Result<Score> {
        let s = s.replace('_', "#");
        let (chords, notes) = s
            .split_once('~')
            .ok_or_else(|| Error::Deserialization("invalid chords / notes split".into()))?;

        let chords = if chords.is_empty() {
            Vec::new()
        } else {
            chords
                .split('|')
                .map(|c| self.parse_chord(c))
                .collect::<Result<Vec<_>>>()?
        };
        let notes = if notes.is_empty() {
            Vec::new()
        } else {
            notes
                .split('|')
                .map(Self::parse_note)
                .collect::<Result<Vec<_>>>()?
        };
        Ok(Score::new(chords, NoteGroup::from_events(notes)))
    }
}

/// Registry of every score format, writing the newest
pub fn score_serializers(
    chord_dictionary: ChordDictionary,
) -> Result<SerializationDictionary<Score>> {
    SerializationDictionary::new(
        vec![Box::new(ScoreSerializerV0::new(chord_dictionary))],
        ScoreSerializerV0::VERSION,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::western::western_chord_dictionary;

    struct StringArrayV1;
    struct StringArrayV2;

    impl VersionedSerializer<Vec<String>> for StringArrayV1 {
        fn version(&self) -> &str {
            "v1"
        }

        fn serialize(&self, object: &Vec<String>) -> Result<String> {
            Ok(object.join(","))
        }

        fn deserialize(&self, s: &str) -> Result<Vec<String>> {
            Ok(s.split(',').map(String::from).collect())
        }
    }

    impl VersionedSerializer<Vec<String>> for StringArrayV2 {
        fn version(&self) -> &str {
            "v2"
        }

        fn serialize(&self, object: &Vec<String>) -> Result<String> {
            Ok(format!("[{}]", object.join(",")))
        }

        fn deserialize(&self, s: &str) -> Result<Vec<String>> {
            let inner = s
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
                .ok_or_else(|| Error::Deserialization(s.to_string()))?;
            Ok(inner.split(',').map(String::from).collect())
        }
    }

    fn strings() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    fn dictionary() -> SerializationDictionary<Vec<String>> {
        SerializationDictionary::new(vec![Box::new(StringArrayV1), Box::new(StringArrayV2)], "v2")
            .unwrap()
    }

    fn score_dictionary() -> SerializationDictionary<Score> {
        score_serializers(western_chord_dictionary()).unwrap()
    }

    const ONE_BAR: &str = "v0|E4-m~D4-0-1|A4-1-1.5|C4-1.5-2|D4-2-3|B4-3-4";
    const TWO_BARS: &str =
        "v0|D4-m7|E4-~A4-0-1|G3-1-1.5|F4-1.5-2|D4-2-3|E4-3-4|G_4-4-5|B4-5-5.5|G_4-5.5-6|A4-6-7|G_4-7-8";
    const FOUR_BARS: &str = "v0|E4-7|F4-maj7|F4-maj7|A4-7~E4-0-1|E4-1-2|B4-2-2.5|E4-2.5-3|E4-3-3.5|E4-3.5-4|B4-4-5|A4-5-6|A4-6-7|G4-7-8|D4-8-9|G3-9-9.5|D4-9.5-10|A4-10-11|G3-11-12|F4-12-12.5|G3-12.5-13|B4-13-13.5|C_4-13.5-14|G4-14-15|F4-15-16";

    #[test]
    fn test_basic_serialization() {
        assert_eq!(StringArrayV1.serialize(&strings()).unwrap(), "a,b,c");
        assert_eq!(StringArrayV1.deserialize("a,b,c").unwrap(), strings());
    }

    #[test]
    fn test_versioned_serialization() {
        let dictionary = dictionary();
        assert_eq!(dictionary.serialize(&strings(), Some("v1")).unwrap(), "v1|a,b,c");
        assert_eq!(dictionary.serialize(&strings(), Some("v2")).unwrap(), "v2|[a,b,c]");
        assert_eq!(dictionary.serialize(&strings(), None).unwrap(), "v2|[a,b,c]");
        assert_eq!(
            dictionary.serialize(&strings(), Some("v3")),
            Err(Error::UnknownVersion("v3".into()))
        );
        assert_eq!(dictionary.versions(), vec!["v1", "v2"]);
    }

    #[test]
    fn test_versioned_deserialization() {
        let dictionary = dictionary();
        assert_eq!(dictionary.deserialize("v1|a,b,c").unwrap(), strings());
        assert_eq!(dictionary.deserialize("v2|[a,b,c]").unwrap(), strings());
        assert_eq!(
            dictionary.deserialize("v3|a,b,c"),
            Err(Error::UnknownVersion("v3".into()))
        );
        assert!(matches!(
            dictionary.deserialize("a,b,c"),
            Err(Error::Deserialization(_))
        ));
    }

    #[test]
    fn test_deserialize_into() {
        let dictionary = dictionary();
        let mut target = vec!["x".to_string()];
        dictionary.deserialize_into("v1|a,b,c", &mut target).unwrap();
        assert_eq!(target, strings());

        assert!(dictionary.deserialize_into("v2|a,b", &mut target).is_err());
        assert_eq!(target, strings());
    }

    #[test]
    fn test_invalid_versions() {
        struct Unversioned;
        impl VersionedSerializer<Vec<String>> for Unversioned {
            fn version(&self) -> &str {
                ""
            }
            fn serialize(&self, _: &Vec<String>) -> Result<String> {
                Ok(String::new())
            }
            fn deserialize(&self, _: &str) -> Result<Vec<String>> {
                Ok(Vec::new())
            }
        }
        struct Piped;
        impl VersionedSerializer<Vec<String>> for Piped {
            fn version(&self) -> &str {
                "v|1"
            }
            fn serialize(&self, _: &Vec<String>) -> Result<String> {
                Ok(String::new())
            }
            fn deserialize(&self, _: &str) -> Result<Vec<String>> {
                Ok(Vec::new())
            }
        }

        assert!(matches!(
            SerializationDictionary::new(vec![Box::new(Unversioned)], "v1"),
            Err(Error::InvalidVersion(_))
        ));
        assert!(matches!(
            SerializationDictionary::new(vec![Box::new(Piped)], "v1"),
            Err(Error::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_score_one_bar() {
        let dictionary = score_dictionary();
        let score = dictionary.deserialize(ONE_BAR).unwrap();
        assert_eq!(score.chords.len(), 1);
        assert_eq!(score.chords[0].name, "Em");
        assert_eq!(
            score.notes.iter_strings().collect::<Vec<_>>(),
            vec!["D4,0,1", "A4,1,1.5", "C4,1.5,2", "D4,2,3", "B4,3,4"]
        );
        assert_eq!(dictionary.serialize(&score, None).unwrap(), ONE_BAR);
    }

    #[test]
    fn test_score_round_trips() {
        let dictionary = score_dictionary();
        for fixture in [ONE_BAR, TWO_BARS, FOUR_BARS] {
            let score = dictionary.deserialize(fixture).unwrap();
            assert_eq!(dictionary.serialize(&score, None).unwrap(), fixture);
        }
    }

    #[test]
    fn test_score_sharps_and_major_suffix() {
        let score = score_dictionary().deserialize(TWO_BARS).unwrap();
        let names: Vec<&str> = score.chords.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Dm7", "E"]);
        assert!(score.notes.iter_strings().any(|s| s == "G#4,4,5"));
        assert_eq!(score.notes.length(), 10);
    }

    #[test]
    fn test_score_negative_octave() {
        let dictionary = score_dictionary();
        let score = dictionary.deserialize("v0|Bb-3-maj7~C#-2-0.5-1.25").unwrap();
        assert_eq!(score.chords[0].root.to_string(), "Bb-3");
        assert_eq!(score.notes.iter_strings().collect::<Vec<_>>(), vec!["C#-2,0.5,1.25"]);
        assert_eq!(
            dictionary.serialize(&score, None).unwrap(),
            "v0|Bb-3-maj7~C_-2-0.5-1.25"
        );
    }

    #[test]
    fn test_score_errors() {
        let dictionary = score_dictionary();
        assert!(matches!(
            dictionary.deserialize("v0|E4-m"),
            Err(Error::Deserialization(_))
        ));
        assert!(matches!(
            dictionary.deserialize("v0|E4-sus9~D4-0-1"),
            Err(Error::UnknownChordSuffix(_))
        ));
        assert!(matches!(
            dictionary.deserialize("v0|E4-m~D4-0"),
            Err(Error::Deserialization(_))
        ));
        assert!(matches!(
            dictionary.deserialize("v0|E4-m~X4-0-1"),
            Err(Error::InvalidNote(_))
        ));
    }

    #[test]
    fn test_empty_score() {
        let dictionary = score_dictionary();
        let score = dictionary.deserialize("v0|~").unwrap();
        assert!(score.chords.is_empty());
        assert!(score.notes.is_empty());
        assert_eq!(dictionary.serialize(&Score::default(), None).unwrap(), "v0|~");
    }
}
