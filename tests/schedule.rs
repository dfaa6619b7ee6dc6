use chrono::{Duration, NaiveDate, NaiveDateTime};
use recurbuy::core::frequency::Frequency;
use recurbuy::core::schedule::{parse_start, MissedTargets, Schedule};
use recurbuy::ErrorKind;

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("datetime")
}

#[test]
fn deposit_is_armed_one_minute_before_purchase() {
    let schedule = Schedule::from_start(Frequency::Weekly, "2022-01-01", "10:00 AM").expect("schedule");
    assert_eq!(schedule.next_purchase_at(), at(2022, 1, 1, 10, 0));
    assert_eq!(schedule.next_deposit_at(), at(2022, 1, 1, 9, 59));
    assert_eq!(schedule.purchase_date(), "2022-01-01");
}

#[test]
fn weekly_advances_by_seven_days() {
    let mut schedule = Schedule::new(Frequency::Weekly, at(2022, 1, 1, 10, 0));
    schedule.advance_purchase().expect("advance");
    assert_eq!(schedule.next_purchase_at(), at(2022, 1, 8, 10, 0));
    schedule.advance_purchase().expect("advance");
    assert_eq!(schedule.next_purchase_at(), at(2022, 1, 15, 10, 0));
    assert_eq!(schedule.next_deposit_at(), at(2022, 1, 1, 9, 59));
}

#[test]
fn each_frequency_has_its_own_step() {
    let start = at(2022, 3, 15, 8, 30);
    let expected = [
        (Frequency::Daily, at(2022, 3, 16, 8, 30)),
        (Frequency::Weekly, at(2022, 3, 22, 8, 30)),
        (Frequency::Biweekly, at(2022, 3, 29, 8, 30)),
        (Frequency::Monthly, at(2022, 4, 15, 8, 30)),
    ];
    for (frequency, next) in expected {
        assert_eq!(frequency.advance(start).expect("advance"), next, "{frequency}");
    }
}

#[test]
fn monthly_clamps_to_end_of_short_month() {
    let mut schedule = Schedule::new(Frequency::Monthly, at(2022, 1, 31, 10, 0));
    schedule.advance_purchase().expect("advance");
    assert_eq!(schedule.next_purchase_at(), at(2022, 2, 28, 10, 0));
    schedule.advance_deposit().expect("advance");
    assert_eq!(schedule.next_deposit_at(), at(2022, 2, 28, 9, 59));
}

#[test]
fn monthly_midnight_start_keeps_deposit_before_purchase() {
    let mut schedule = Schedule::from_start(Frequency::Monthly, "2022-03-31", "12:00 AM").expect("schedule");
    assert_eq!(schedule.next_deposit_at(), at(2022, 3, 30, 23, 59));

    schedule.advance_deposit().expect("deposit");
    schedule.advance_purchase().expect("purchase");
    assert_eq!(schedule.next_deposit_at(), at(2022, 4, 29, 23, 59));
    assert_eq!(schedule.next_purchase_at(), at(2022, 4, 30, 0, 0));

    for _ in 0..11 {
        schedule.advance_deposit().expect("deposit");
        schedule.advance_purchase().expect("purchase");
        assert!(schedule.next_deposit_at() < schedule.next_purchase_at());
        assert_eq!(
            schedule.next_purchase_at() - schedule.next_deposit_at(),
            Duration::minutes(1)
        );
        assert_eq!(schedule.funded_purchase_at(), schedule.next_purchase_at());
    }
}

#[test]
fn missed_minute_rearms_for_next_period() {
    let mut schedule = Schedule::new(Frequency::Weekly, at(2022, 1, 1, 10, 0));
    assert!(!schedule.is_time_to_purchase(at(2022, 1, 1, 10, 1)));

    let missed = schedule.skip_missed(at(2022, 1, 1, 10, 1)).expect("skip");
    assert_eq!(missed, MissedTargets { deposits: 1, purchases: 1 });
    assert_eq!(schedule.next_deposit_at(), at(2022, 1, 8, 9, 59));
    assert_eq!(schedule.next_purchase_at(), at(2022, 1, 8, 10, 0));
    assert!(schedule.is_time_to_deposit(at(2022, 1, 8, 9, 59)));
    assert!(schedule.is_time_to_purchase(at(2022, 1, 8, 10, 0)));
}

#[test]
fn long_stall_skips_every_elapsed_period() {
    let mut schedule = Schedule::new(Frequency::Weekly, at(2022, 1, 1, 10, 0));
    let missed = schedule.skip_missed(at(2022, 3, 1, 0, 0)).expect("skip");
    assert_eq!(missed, MissedTargets { deposits: 9, purchases: 9 });
    assert_eq!(schedule.next_purchase_at(), at(2022, 3, 5, 10, 0));
    assert_eq!(schedule.next_deposit_at(), at(2022, 3, 5, 9, 59));
}

#[test]
fn current_minute_is_not_missed() {
    let mut schedule = Schedule::new(Frequency::Daily, at(2022, 1, 1, 10, 0));
    let missed = schedule
        .skip_missed(at(2022, 1, 1, 10, 0) + Duration::seconds(45))
        .expect("skip");
    assert_eq!(missed, MissedTargets { deposits: 1, purchases: 0 });
    assert!(missed.any());
    assert_eq!(schedule.next_purchase_at(), at(2022, 1, 1, 10, 0));
    assert_eq!(schedule.next_deposit_at(), at(2022, 1, 2, 9, 59));

    let untouched = schedule.clone();
    let missed = schedule.skip_missed(at(2022, 1, 1, 9, 0)).expect("skip");
    assert!(!missed.any());
    assert_eq!(schedule, untouched);
}

#[test]
fn due_only_during_the_exact_minute() {
    let schedule = Schedule::new(Frequency::Daily, at(2022, 1, 1, 10, 0));
    let target = at(2022, 1, 1, 10, 0);
    assert!(schedule.is_time_to_purchase(target));
    assert!(schedule.is_time_to_purchase(target + Duration::seconds(59)));
    assert!(!schedule.is_time_to_purchase(target + Duration::minutes(1)));
    assert!(!schedule.is_time_to_purchase(target - Duration::minutes(1)));

    assert!(schedule.is_time_to_deposit(at(2022, 1, 1, 9, 59)));
    assert!(!schedule.is_time_to_deposit(target));
}

#[test]
fn invalid_frequency_update_leaves_schedule_unchanged() {
    let mut schedule = Schedule::new(Frequency::Weekly, at(2022, 1, 1, 10, 0));
    let before = schedule.clone();
    let err = schedule.update_frequency("annually").expect_err("invalid");
    assert_eq!(err.kind, ErrorKind::InvalidFrequency);
    assert_eq!(schedule, before);

    schedule.update_frequency("Monthly").expect("valid");
    assert_eq!(schedule.period(), Frequency::Monthly);
    assert_eq!(schedule.next_purchase_at(), before.next_purchase_at());
    schedule.advance_purchase().expect("advance");
    assert_eq!(schedule.next_purchase_at(), at(2022, 2, 1, 10, 0));
}

#[test]
fn rejects_malformed_start() {
    for (date, time) in [
        ("2022-01-01", ""),
        ("", "10:00 AM"),
        ("01/01/2022", "10:00 AM"),
        ("2022-01-01", "25:00 PM"),
    ] {
        let err = parse_start(date, time).expect_err("invalid");
        assert_eq!(err.kind, ErrorKind::InvalidArgument, "{date} {time}");
    }
}
