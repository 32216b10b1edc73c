use super::error::CalcError;
use super::model::Mark;
use super::policy::round_half_up_2;

/// Weighted mean of subject averages by subject weight.
///
/// Ungraded subjects and zero-weight subjects are left out of both sums, so a
/// subject with no recorded work never pulls the overall toward zero.
pub fn aggregate_subjects<I>(term_id: &str, subjects: I) -> Result<Mark, CalcError>
where
    I: IntoIterator<Item = (Mark, f64)>,
{
    let mut numerator = 0.0_f64;
    let mut denominator = 0.0_f64;

    for (average, weight) in subjects {
        let Mark::Graded(avg) = average else {
            continue;
        };
        if weight <= 0.0 {
            continue;
        }
        numerator += avg * weight;
        denominator += weight;
    }

    if !numerator.is_finite() || !denominator.is_finite() {
        return Err(CalcError::InvalidInput {
            entity: "term",
            id: term_id.to_string(),
            message: "subject weights sum past the representable range".to_string(),
        });
    }

    Ok(if denominator > 0.0 {
        Mark::Graded(round_half_up_2(numerator / denominator))
    } else {
        Mark::Ungraded
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overall<I: IntoIterator<Item = (Mark, f64)>>(subjects: I) -> Mark {
        aggregate_subjects("t1", subjects).expect("aggregate")
    }

    #[test]
    fn ungraded_subject_is_excluded_not_zeroed() {
        let r = overall([(Mark::Graded(80.0), 70.0), (Mark::Ungraded, 30.0)]);
        assert_eq!(r, Mark::Graded(80.0));
    }

    #[test]
    fn weights_are_relative_not_percent_of_100() {
        let r = overall([(Mark::Graded(90.0), 3.0), (Mark::Graded(60.0), 1.0)]);
        assert_eq!(r, Mark::Graded(82.5));
    }

    #[test]
    fn zero_total_weight_has_no_result() {
        assert_eq!(overall(Vec::<(Mark, f64)>::new()), Mark::Ungraded);
        assert_eq!(overall([(Mark::Ungraded, 50.0)]), Mark::Ungraded);
        assert_eq!(overall([(Mark::Graded(75.0), 0.0)]), Mark::Ungraded);
    }

    #[test]
    fn overflowing_subject_sum_is_rejected() {
        let err = aggregate_subjects(
            "t1",
            [(Mark::Graded(100.0), 1e308), (Mark::Graded(100.0), 1e308)],
        )
        .expect_err("overflow");
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn overall_rounds_to_two_decimals() {
        let r = overall([
            (Mark::Graded(90.0), 1.0),
            (Mark::Graded(80.0), 1.0),
            (Mark::Graded(81.0), 1.0),
        ]);
        assert_eq!(r, Mark::Graded(83.67));
    }
}
