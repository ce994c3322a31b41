//! Grammar of CF time `units` attributes: `<unit> since <reference>`.
//!
//! Only the fixed-length units are recognised; months and years depend on
//! the calendar and are left to the caller as plain numbers.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{i32, one_of, space0, space1, u32},
    combinator::{all_consuming, map_opt, opt, value},
    number::complete::double,
    sequence::{preceded, separated_pair, tuple},
    IResult,
};

/// Microseconds in one unit.
fn unit(input: &str) -> IResult<&str, i64> {
    #[rustfmt::skip]
    let days = value(
        86_400_000_000,
        alt((
            tag("days"),
            tag("day"),
            tag("d")
        )),
    );
    #[rustfmt::skip]
    let hours = value(
        3_600_000_000,
        alt((
            tag("hours"),
            tag("hour"),
            tag("hrs"),
            tag("hr"),
            tag("h")
        )),
    );
    #[rustfmt::skip]
    let minutes = value(
        60_000_000,
        alt((
            tag("minutes"),
            tag("minute"),
            tag("mins"),
            tag("min")
        )),
    );
    let seconds = value(
        1_000_000,
        alt((
            tag("seconds"),
            tag("second"),
            tag("secs"),
            tag("sec"),
            tag("s"),
        )),
    );
    let milliseconds = value(
        1_000,
        alt((
            tag("milliseconds"),
            tag("millisecond"),
            tag("msecs"),
            tag("msec"),
            tag("ms"),
        )),
    );
    let microseconds = value(
        1,
        alt((
            tag("microseconds"),
            tag("microsecond"),
            tag("usecs"),
            tag("usec"),
            tag("us"),
        )),
    );

    alt((days, hours, minutes, seconds, milliseconds, microseconds))(input)
}

/// `y`, `y-m` or `y-m-d`; missing fields default to 1.
fn date(input: &str) -> IResult<&str, NaiveDate> {
    map_opt(
        tuple((
            i32,
            opt(preceded(tag("-"), u32)),
            opt(preceded(tag("-"), u32)),
        )),
        |(year, month, day)| NaiveDate::from_ymd_opt(year, month.unwrap_or(1), day.unwrap_or(1)),
    )(input)
}

/// `h`, `h:m` or `h:m:s` with fractional seconds.
fn time(input: &str) -> IResult<&str, NaiveTime> {
    map_opt(
        tuple((
            u32,
            opt(preceded(tag(":"), u32)),
            opt(preceded(tag(":"), double)),
        )),
        |(hour, minute, second)| {
            let second = second.unwrap_or(0.0);
            if !(0.0..60.0).contains(&second) {
                return None;
            }
            let nanos = ((second.fract() * 1e9).round() as u32).min(999_999_999);
            NaiveTime::from_hms_nano_opt(hour, minute.unwrap_or(0), second.trunc() as u32, nanos)
        },
    )(input)
}

/// Offset from UTC in minutes: `+hh:mm`, `-hhmm`, `+h`, or a UTC marker.
fn utc_offset(input: &str) -> IResult<&str, i64> {
    let signed = map_opt(
        tuple((one_of("+-"), u32, opt(preceded(tag(":"), u32)))),
        |(sign, first, minutes)| {
            let (h, m) = match minutes {
                Some(m) => (first, m),
                None if first >= 100 => (first / 100, first % 100),
                None => (first, 0),
            };
            if h > 23 || m > 59 {
                return None;
            }
            let total = i64::from(h * 60 + m);
            Some(if sign == '-' { -total } else { total })
        },
    );
    let utc = value(0, alt((tag("utc"), tag("gmt"), tag("z"))));
    alt((signed, utc))(input)
}

/// Reference instant, shifted to UTC.
fn reference(input: &str) -> IResult<&str, NaiveDateTime> {
    let clock = preceded(alt((space1, tag("t"))), time);
    let zone = preceded(space0, utc_offset);
    map_opt(
        tuple((date, opt(clock), opt(zone))),
        |(date, clock, minutes)| {
            let local = date.and_time(clock.unwrap_or(NaiveTime::MIN));
            local.checked_sub_signed(TimeDelta::try_minutes(minutes.unwrap_or(0))?)
        },
    )(input)
}

/// Parse `"<unit> since <reference>"` into microseconds per unit and the
/// reference instant. Anything unrecognised yields `None`.
pub fn parse_time_units(units: &str) -> Option<(i64, NaiveDateTime)> {
    let lower = units.trim().to_ascii_lowercase();
    let parsed: IResult<&str, (i64, NaiveDateTime)> = all_consuming(separated_pair(
        unit,
        tuple((space1, tag("since"), space1)),
        reference,
    ))(lower.as_str());
    parsed.ok().map(|(_, units)| units)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn common_unit_strings() {
        assert_eq!(
            parse_time_units("days since 1970-01-01"),
            Some((86_400_000_000, ymd_hms(1970, 1, 1, 0, 0, 0)))
        );
        assert_eq!(
            parse_time_units("Hours since 2000-1-1 6:30"),
            Some((3_600_000_000, ymd_hms(2000, 1, 1, 6, 30, 0)))
        );
        assert_eq!(
            parse_time_units("seconds since 2000-01-01T12:00:00Z"),
            Some((1_000_000, ymd_hms(2000, 1, 1, 12, 0, 0)))
        );
        assert_eq!(
            parse_time_units("ms since 1990-06"),
            Some((1_000, ymd_hms(1990, 6, 1, 0, 0, 0)))
        );
        assert_eq!(
            parse_time_units("  minutes since 2000-01-01 00:00:00 UTC "),
            Some((60_000_000, ymd_hms(2000, 1, 1, 0, 0, 0)))
        );
    }

    #[test]
    fn offsets_shift_to_utc() {
        assert_eq!(
            parse_time_units("minutes since 2000-01-01 05:00:00 +05:00"),
            Some((60_000_000, ymd_hms(2000, 1, 1, 0, 0, 0)))
        );
        assert_eq!(
            parse_time_units("hours since 2000-01-01 00:00 -0130"),
            Some((3_600_000_000, ymd_hms(2000, 1, 1, 1, 30, 0)))
        );
        assert_eq!(
            parse_time_units("hours since 2000-01-01 12:00+2"),
            Some((3_600_000_000, ymd_hms(2000, 1, 1, 10, 0, 0)))
        );
    }

    #[test]
    fn fractional_seconds() {
        let (_, t) = parse_time_units("seconds since 2000-01-01 00:00:01.25").unwrap();
        assert_eq!(t, ymd_hms(2000, 1, 1, 0, 0, 1) + TimeDelta::milliseconds(250));
    }

    #[test]
    fn unrecognised_units_are_rejected() {
        assert_eq!(parse_time_units("months since 2000-01-01"), None);
        assert_eq!(parse_time_units("kelvin"), None);
        assert_eq!(parse_time_units("days since"), None);
        assert_eq!(parse_time_units("days since 2000-13-01"), None);
        assert_eq!(parse_time_units("days since 2000-01-01 25:00"), None);
        assert_eq!(parse_time_units("days since 2000-01-01 00:00:61"), None);
    }

    #[test]
    fn malformed_offsets_are_rejected_without_panicking() {
        // Multibyte character inside the offset.
        assert_eq!(parse_time_units("days since 2000-01-01 00:00 +1é1"), None);
        // Offset far beyond any integer width.
        assert_eq!(parse_time_units("days since 2000-01-01 00:00 +100000000000000000"), None);
        // Fits in u32 but is not a valid clock offset.
        assert_eq!(parse_time_units("days since 2000-01-01 00:00 +4000000000"), None);
        assert_eq!(parse_time_units("days since 2000-01-01 00:00 +24:00"), None);
        assert_eq!(parse_time_units("days since 2000-01-01 00:00 +05:60"), None);
        assert_eq!(parse_time_units("days since 2000-01-01 00:00 +é"), None);
    }

    #[test]
    fn extreme_reference_dates_do_not_overflow() {
        assert_eq!(parse_time_units("days since 262142-12-31 23:59 -23:59"), None);
        assert_eq!(parse_time_units("days since 99999999999-01-01"), None);
    }
}
