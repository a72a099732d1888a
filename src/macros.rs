//! Assertion macros for test bodies. Each records the caller's `file!()` and
//! `line!()` on the check it creates.
//!
//! ```
//! use trellis::{TestCase, TestNode, TestResult};
//!
//! let mut case = TestCase::new("lengths", |test| {
//!     let words = vec!["a", "bb"];
//!     trellis::abort_if!(test, words.is_empty());
//!     trellis::fail_if_neq!(test, words[1].len(), 2);
//!     trellis::pass!(test);
//! });
//! case.run().unwrap();
//! assert_eq!(case.result(), TestResult::Passed);
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __trellis_comparison {
    ($op:literal, $left:expr, $right:expr, $left_value:expr, $right_value:expr) => {
        format!(
            "`{}` {} `{}` (left: {:?}, right: {:?})",
            stringify!($left),
            $op,
            stringify!($right),
            $left_value,
            $right_value
        )
    };
}

#[macro_export]
macro_rules! pass {
    ($test:expr) => {
        $test.pass()
    };
}

#[macro_export]
macro_rules! fail {
    ($test:expr) => {
        $test.fail("explicit failure", file!(), line!())
    };
    ($test:expr, $($msg:tt)+) => {
        $test.fail(format!($($msg)+), file!(), line!())
    };
}

#[macro_export]
macro_rules! fail_if {
    ($test:expr, $cond:expr) => {
        $test.fail_if($cond, concat!("`", stringify!($cond), "` is true"), file!(), line!())
    };
    ($test:expr, $cond:expr, $($msg:tt)+) => {
        if $cond {
            $test.fail(format!($($msg)+), file!(), line!());
        }
    };
}

#[macro_export]
macro_rules! fail_if_not {
    ($test:expr, $cond:expr) => {
        $test.fail_if(!$cond, concat!("`", stringify!($cond), "` is false"), file!(), line!())
    };
    ($test:expr, $cond:expr, $($msg:tt)+) => {
        if !$cond {
            $test.fail(format!($($msg)+), file!(), line!());
        }
    };
}

#[macro_export]
macro_rules! fail_if_eq {
    ($test:expr, $left:expr, $right:expr) => {
        match (&$left, &$right) {
            (left, right) => {
                if *left == *right {
                    $test.fail(
                        $crate::__trellis_comparison!("==", $left, $right, left, right),
                        file!(),
                        line!(),
                    );
                }
            }
        }
    };
}

#[macro_export]
macro_rules! fail_if_neq {
    ($test:expr, $value:expr, $reference:expr) => {
        match (&$value, &$reference) {
            (value, reference) => {
                if *value != *reference {
                    $test.fail(
                        $crate::__trellis_comparison!("!=", $value, $reference, value, reference),
                        file!(),
                        line!(),
                    );
                }
            }
        }
    };
}

#[macro_export]
macro_rules! abort {
    ($test:expr) => {
        $test.abort("explicit abort", file!(), line!())
    };
    ($test:expr, $($msg:tt)+) => {
        $test.abort(format!($($msg)+), file!(), line!())
    };
}

#[macro_export]
macro_rules! abort_if {
    ($test:expr, $cond:expr) => {
        $test.abort_if($cond, concat!("`", stringify!($cond), "` is true"), file!(), line!())
    };
    ($test:expr, $cond:expr, $($msg:tt)+) => {
        if $cond {
            $test.abort(format!($($msg)+), file!(), line!());
        }
    };
}

#[macro_export]
macro_rules! abort_if_not {
    ($test:expr, $cond:expr) => {
        $test.abort_if(!$cond, concat!("`", stringify!($cond), "` is false"), file!(), line!())
    };
    ($test:expr, $cond:expr, $($msg:tt)+) => {
        if !$cond {
            $test.abort(format!($($msg)+), file!(), line!());
        }
    };
}

#[macro_export]
macro_rules! abort_if_eq {
    ($test:expr, $left:expr, $right:expr) => {
        match (&$left, &$right) {
            (left, right) => {
                if *left == *right {
                    $test.abort(
                        $crate::__trellis_comparison!("==", $left, $right, left, right),
                        file!(),
                        line!(),
                    );
                }
            }
        }
    };
}

#[macro_export]
macro_rules! abort_if_neq {
    ($test:expr, $value:expr, $reference:expr) => {
        match (&$value, &$reference) {
            (value, reference) => {
                if *value != *reference {
                    $test.abort(
                        $crate::__trellis_comparison!("!=", $value, $reference, value, reference),
                        file!(),
                        line!(),
                    );
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::case::TestCase;
    use crate::node::TestNode;
    use crate::result::TestResult;

    #[test]
    fn failing_macros_record_this_file() {
        let mut case = TestCase::new("macros", |test| {
            fail_if!(test, 1 + 1 == 2);
            fail_if_not!(test, 2 > 3, "two is not above {}", 3);
            fail_if_eq!(test, "a", "a");
            fail_if_neq!(test, 40 + 1, 42);
            pass!(test);
        });
        case.run().unwrap();

        let checks = case.test().checks();
        assert_eq!(case.result(), TestResult::Failed);
        assert_eq!(checks.len(), 4);
        assert!(checks.iter().all(|c| c.file.ends_with("macros.rs")));
        assert_eq!(checks[0].message, "`1 + 1 == 2` is true");
        assert_eq!(checks[1].message, "two is not above 3");
        assert_eq!(checks[3].message, "`40 + 1` != `42` (left: 41, right: 42)");
    }

    #[test]
    fn passing_conditions_record_nothing() {
        let mut case = TestCase::new("quiet", |test| {
            fail_if!(test, false);
            fail_if_eq!(test, 1, 2);
            abort_if_not!(test, true);
            abort_if_neq!(test, "x", "x");
            pass!(test);
        });
        case.run().unwrap();
        assert_eq!(case.result(), TestResult::Passed);
        assert!(case.test().checks().is_empty());
    }

    #[test]
    fn abort_macros_stop_the_body() {
        let mut case = TestCase::new("abort", |test| {
            abort_if_eq!(test, 3, 3);
            fail!(test, "unreachable");
        });
        case.run().unwrap();

        let checks = case.test().checks();
        assert_eq!(case.result(), TestResult::Failed);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].message, "`3` == `3` (left: 3, right: 3)");
    }
}
