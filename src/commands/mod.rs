// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod currencies;
pub mod accounts;
pub mod categories;
pub mod incomes;
pub mod expenses;
pub mod transfers;
pub mod history;
pub mod summary;
pub mod exporter;
pub mod doctor;
