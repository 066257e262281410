//! KML tracker feed: one `Placemark` per tracker, each holding a `gx:Track` of timestamped
//! fixes and a `gx:SimpleArrayData` of pressures aligned with those fixes.

use std::path::Path;

use balloon_core::atmosphere::fall_rate_from_pressure;
use chrono::NaiveDateTime;
use roxmltree::{Document, Node};
use tracing::{debug, warn};

use crate::{ProfileError, ProfileLevel, ProfileTable, read_to_string};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Read a saved feed and extract the named tracker.
pub fn from_path<P: AsRef<Path>>(path: P, tracker: &str) -> Result<ProfileTable, ProfileError> {
    parse(&read_to_string(path.as_ref())?, tracker)
}

/// Extract the named tracker's path. Observation times are seconds since its first fix.
pub fn parse(kml: &str, tracker: &str) -> Result<ProfileTable, ProfileError> {
    let doc = Document::parse(kml)?;
    let placemark = doc
        .descendants()
        .filter(|n| n.has_tag_name_local("Placemark"))
        .find(|p| {
            p.children()
                .find(|c| c.has_tag_name_local("name"))
                .and_then(|c| c.text())
                .is_some_and(|name| name.trim() == tracker)
        })
        .ok_or_else(|| ProfileError::TrackerNotFound(tracker.to_string()))?;

    let track = placemark
        .descendants()
        .find(|n| n.has_tag_name_local("Track"))
        .ok_or_else(|| parse_error(&doc, placemark, "placemark has no gx:Track"))?;

    let mut times = Vec::new();
    let mut coords = Vec::new();
    for child in track.children().filter(Node::is_element) {
        let text = child.text().unwrap_or("").trim();
        match child.tag_name().name() {
            "when" => {
                let time = NaiveDateTime::parse_from_str(text, TIME_FORMAT)
                    .map_err(|e| parse_error(&doc, child, &format!("bad timestamp `{text}`: {e}")))?;
                times.push(time);
            }
            "coord" => {
                let parts = text
                    .split_whitespace()
                    .map(str::parse::<f64>)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| parse_error(&doc, child, &format!("bad coordinate `{text}`: {e}")))?;
                let [lon, lat, alt] = parts[..] else {
                    return Err(parse_error(&doc, child, "coordinate needs lon lat alt"));
                };
                coords.push((lon, lat, alt));
            }
            _ => {}
        }
    }

    let pressures = placemark
        .descendants()
        .filter(|n| n.has_tag_name_local("SimpleArrayData"))
        .find(|n| n.attribute("name") == Some("pressure"))
        .map(|array| {
            array
                .children()
                .filter(|n| n.has_tag_name_local("value"))
                .map(|n| {
                    let text = n.text().unwrap_or("").trim();
                    text.split_whitespace()
                        .next()
                        .and_then(|v| v.parse::<f64>().ok())
                        .ok_or_else(|| parse_error(&doc, n, &format!("bad pressure `{text}`")))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .ok_or_else(|| parse_error(&doc, placemark, "placemark has no pressure array"))?;

    if times.len() != coords.len() || coords.len() != pressures.len() {
        warn!(
            tracker,
            times = times.len(),
            coords = coords.len(),
            pressures = pressures.len(),
            "tracker arrays differ in length; using the common prefix"
        );
    }

    let Some(&start) = times.first() else {
        return Err(ProfileError::Empty);
    };
    let mut levels = Vec::new();
    for ((time, (lon, lat, alt)), pressure) in times.iter().zip(coords).zip(pressures) {
        let Some(fall_rate) = fall_rate_from_pressure(pressure) else {
            debug!(tracker, pressure, "skipping fix with invalid pressure");
            continue;
        };
        let elapsed = (*time - start).num_milliseconds() as f64 / 1_000.0;
        levels.push(ProfileLevel::new(alt, 0.0, 0.0, fall_rate).with_fix(lon, lat, elapsed));
    }

    ProfileTable::new(levels)
}

trait LocalName {
    fn has_tag_name_local(&self, name: &str) -> bool;
}

impl LocalName for Node<'_, '_> {
    fn has_tag_name_local(&self, name: &str) -> bool {
        self.is_element() && self.tag_name().name() == name
    }
}

fn parse_error(doc: &Document<'_>, node: Node<'_, '_>, message: &str) -> ProfileError {
    ProfileError::Parse {
        line: doc.text_pos_at(node.range().start).row as usize,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:gx="http://www.google.com/kml/ext/2.2">
<Document>
  <Placemark>
    <name>100001</name>
    <gx:Track>
      <when>2023-11-19T18:00:00Z</when>
      <gx:coord>-75.0 43.0 900</gx:coord>
    </gx:Track>
    <ExtendedData><SchemaData>
      <gx:SimpleArrayData name="pressure"><gx:value>910.0</gx:value></gx:SimpleArrayData>
    </SchemaData></ExtendedData>
  </Placemark>
  <Placemark>
    <name>209825</name>
    <gx:Track>
      <when>2023-11-19T18:00:00Z</when>
      <when>2023-11-19T18:01:00Z</when>
      <when>2023-11-19T18:02:30Z</when>
      <gx:coord>-76.00 43.70 5000</gx:coord>
      <gx:coord>-75.99 43.70 4700</gx:coord>
      <gx:coord>-75.98 43.71 4250</gx:coord>
    </gx:Track>
    <ExtendedData><SchemaData>
      <gx:SimpleArrayData name="temperature"><gx:value>-20</gx:value></gx:SimpleArrayData>
      <gx:SimpleArrayData name="pressure">
        <gx:value>540.0 hPa</gx:value>
        <gx:value>560.0</gx:value>
        <gx:value>590.0</gx:value>
      </gx:SimpleArrayData>
    </SchemaData></ExtendedData>
  </Placemark>
</Document>
</kml>
"#;

    #[test]
    fn extracts_named_tracker() {
        let table = parse(FEED, "209825").expect("tracker parse");
        assert_eq!(table.len(), 3);
        assert!(table.supports_gap_bridging());
        let last = table.last();
        assert_abs_diff_eq!(last.altitude, 4250.0);
        assert_eq!(last.fix(), Some((-75.98, 43.71, 150.0)));
        assert!(last.fall_rate > 5.0);
    }

    #[test]
    fn unknown_tracker_is_reported() {
        let err = parse(FEED, "999").unwrap_err();
        assert!(matches!(err, ProfileError::TrackerNotFound(name) if name == "999"));
    }

    #[test]
    fn malformed_xml_is_reported() {
        assert!(matches!(parse("<kml>", "1"), Err(ProfileError::Xml(_))));
    }
}
